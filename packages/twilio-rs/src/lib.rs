// Minimal client for Twilio's Programmable Messaging REST API.

use std::collections::HashMap;

pub mod models;
use reqwest::Client;
use thiserror::Error;

use crate::models::{ApiErrorBody, MessageResponse};

const API_BASE_URL: &str = "https://api.twilio.com";

#[derive(Debug, Error)]
pub enum TwilioError {
    #[error("request to Twilio failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Twilio returned {status}: {message}")]
    Api {
        status: u16,
        code: Option<i64>,
        message: String,
    },

    #[error("failed to parse Twilio response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone)]
pub struct TwilioOptions {
    pub account_sid: String,
    pub auth_token: String,
    /// Twilio-registered sender number in E.164 format.
    pub from_number: String,
}

#[derive(Debug, Clone)]
pub struct TwilioService {
    options: TwilioOptions,
    client: Client,
}

impl TwilioService {
    pub fn new(options: TwilioOptions) -> Self {
        Self {
            options,
            client: Client::new(),
        }
    }

    pub fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            API_BASE_URL, self.options.account_sid
        )
    }

    /// Send a plain SMS from the configured sender number.
    pub async fn send_message(&self, to: &str, body: &str) -> Result<MessageResponse, TwilioError> {
        let mut form_body: HashMap<&str, &str> = HashMap::new();
        form_body.insert("To", to);
        form_body.insert("From", &self.options.from_number);
        form_body.insert("Body", body);

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.options.account_sid, Some(&self.options.auth_token))
            .form(&form_body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(parse_api_error(status.as_u16(), &text));
        }

        serde_json::from_str::<MessageResponse>(&text).map_err(|e| TwilioError::Decode(e.to_string()))
    }
}

fn parse_api_error(status: u16, text: &str) -> TwilioError {
    match serde_json::from_str::<ApiErrorBody>(text) {
        Ok(body) => TwilioError::Api {
            status,
            code: body.code,
            message: body.message,
        },
        Err(_) => TwilioError::Api {
            status,
            code: None,
            message: text.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TwilioService {
        TwilioService::new(TwilioOptions {
            account_sid: "AC123".to_string(),
            auth_token: "secret".to_string(),
            from_number: "+15005550006".to_string(),
        })
    }

    #[test]
    fn test_messages_url() {
        assert_eq!(
            service().messages_url(),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages.json"
        );
    }

    #[test]
    fn test_parse_api_error_json() {
        let err = parse_api_error(
            400,
            r#"{"code": 21211, "message": "The 'To' number is not valid.", "status": 400}"#,
        );
        match err {
            TwilioError::Api { status, code, message } => {
                assert_eq!(status, 400);
                assert_eq!(code, Some(21211));
                assert!(message.contains("not valid"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_api_error_ignores_extra_fields() {
        let err = parse_api_error(
            401,
            r#"{"code": 20003, "message": "Authenticate", "more_info": "https://www.twilio.com/docs/errors/20003", "status": 401}"#,
        );
        assert_eq!(err.to_string(), "Twilio returned 401: Authenticate");
    }

    #[test]
    fn test_parse_api_error_plain_text() {
        let err = parse_api_error(503, "upstream unavailable");
        assert_eq!(err.to_string(), "Twilio returned 503: upstream unavailable");
    }

    #[test]
    fn test_message_response_decodes() {
        let body = r#"{"sid": "SM1", "status": "queued", "to": "+919998887777", "error_code": null}"#;
        let msg: MessageResponse = serde_json::from_str(body).unwrap();
        assert_eq!(msg.sid, "SM1");
        assert_eq!(msg.status, "queued");
        assert_eq!(msg.error_code, None);
    }
}
