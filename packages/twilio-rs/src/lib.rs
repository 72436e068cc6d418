// https://www.twilio.com/docs/messaging/api/message-resource

use std::collections::HashMap;

pub mod models;
use reqwest::{header, Client};

use crate::models::MessageResponse;

/// Delivery channel for an outbound message.
///
/// Twilio routes WhatsApp traffic through the same Messages API as SMS;
/// the channel is selected by prefixing the addresses with `whatsapp:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Sms,
    Whatsapp,
}

impl Channel {
    /// Format a phone number as a channel address (`whatsapp:+1555...` or bare E.164).
    pub fn address(self, number: &str) -> String {
        match self {
            Channel::Sms => number.to_string(),
            Channel::Whatsapp => format!("whatsapp:{}", number),
        }
    }

    pub fn parse(s: &str) -> Option<Channel> {
        match s.to_ascii_lowercase().as_str() {
            "sms" => Some(Channel::Sms),
            "whatsapp" => Some(Channel::Whatsapp),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Sms => "sms",
            Channel::Whatsapp => "whatsapp",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TwilioOptions {
    pub account_sid: String,
    pub auth_token: String,
    /// Sender number for SMS traffic (E.164).
    pub sms_from: String,
    /// Sender number for WhatsApp traffic (E.164, without the `whatsapp:` prefix).
    pub whatsapp_from: String,
}

#[derive(Debug, Clone)]
pub struct TwilioService {
    options: TwilioOptions,
}

impl TwilioService {
    pub fn new(options: TwilioOptions) -> Self {
        Self { options }
    }

    /// Send a message over the given channel via the Twilio Messages API.
    pub async fn send_message(
        &self,
        channel: Channel,
        to: &str,
        body: &str,
    ) -> Result<MessageResponse, &'static str> {
        let account_sid = self.options.account_sid.clone();
        let auth_token = self.options.auth_token.clone();

        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{sid}/Messages.json",
            sid = account_sid
        );

        let mut headers = header::HeaderMap::new();
        headers.insert(
            "Content-Type",
            "application/x-www-form-urlencoded"
                .parse()
                .expect("Header value should parse correctly"),
        );

        let from = match channel {
            Channel::Sms => &self.options.sms_from,
            Channel::Whatsapp => &self.options.whatsapp_from,
        };

        let mut form_body: HashMap<&str, String> = HashMap::new();
        form_body.insert("To", channel.address(to));
        form_body.insert("From", channel.address(from));
        form_body.insert("Body", body.to_string());

        let client = Client::new();
        let res = client
            .post(url)
            .basic_auth(account_sid, Some(auth_token))
            .headers(headers)
            .form(&form_body)
            .send()
            .await;

        match res {
            Ok(response) => {
                let status = response.status();
                if !status.is_success() {
                    // Log the error response from Twilio
                    let error_body = response.text().await.unwrap_or_default();
                    eprintln!("Twilio error ({}): {}", status, error_body);
                    return Err("Twilio returned an error");
                }

                let result = response.json::<MessageResponse>().await;
                match result {
                    Ok(data) => Ok(data),
                    Err(e) => {
                        eprintln!("Failed to parse Twilio response: {}", e);
                        Err("Error parsing message response")
                    }
                }
            }
            Err(e) => {
                eprintln!("Request to Twilio failed: {}", e);
                Err("Error sending message")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sms_address_is_bare_number() {
        assert_eq!(Channel::Sms.address("+15550001111"), "+15550001111");
    }

    #[test]
    fn whatsapp_address_is_prefixed() {
        assert_eq!(
            Channel::Whatsapp.address("+15550001111"),
            "whatsapp:+15550001111"
        );
    }

    #[test]
    fn channel_parse_is_case_insensitive() {
        assert_eq!(Channel::parse("SMS"), Some(Channel::Sms));
        assert_eq!(Channel::parse("WhatsApp"), Some(Channel::Whatsapp));
        assert_eq!(Channel::parse("email"), None);
    }
}
