//! Mail relay over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use rysetor_core::domain::{Notification, NotificationKind};
use rysetor_core::ports::{Mailer, NotifyError};

#[derive(Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    body: &'a str,
    kind: NotificationKind,
    username: &'a str,
}

/// POSTs each message as JSON to a mail relay.
pub struct WebhookMailer {
    url: String,
    sender: String,
    client: reqwest::Client,
}

const RELAY_TIMEOUT: Duration = Duration::from_secs(10);

impl WebhookMailer {
    /// Fails when the HTTP client cannot be built, e.g. when no TLS backend
    /// can be initialised.
    pub fn new(url: String, sender: String) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(RELAY_TIMEOUT)
            .build()
            .map_err(|e| NotifyError::Transport(format!("cannot build relay client: {e}")))?;

        Ok(Self {
            url,
            sender,
            client,
        })
    }
}

#[async_trait]
impl Mailer for WebhookMailer {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        let payload = RelayMessage {
            from: &self.sender,
            to: &notification.to,
            subject: &notification.subject,
            body: &notification.body,
            kind: notification.kind,
            username: &notification.username,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            return Err(NotifyError::Rejected(format!("relay answered {status}")));
        }
        if !status.is_success() {
            return Err(NotifyError::Transport(format!("relay answered {status}")));
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::sync::Mutex;

    use actix_web::dev::ServerHandle;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, HttpServer, web};
    use serde_json::{Value, json};

    use super::*;

    struct Relay {
        url: String,
        received: web::Data<Mutex<Vec<Value>>>,
        handle: ServerHandle,
    }

    async fn record(
        received: web::Data<Mutex<Vec<Value>>>,
        status: web::Data<StatusCode>,
        body: web::Json<Value>,
    ) -> HttpResponse {
        if let Ok(mut received) = received.lock() {
            received.push(body.into_inner());
        }
        HttpResponse::build(*status.get_ref()).finish()
    }

    /// A local relay that answers every message with `status`.
    fn relay(status: StatusCode) -> Relay {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/send", listener.local_addr().unwrap());
        let received = web::Data::new(Mutex::new(Vec::new()));

        let data = received.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(data.clone())
                .app_data(web::Data::new(status))
                .route("/send", web::post().to(record))
        })
        .workers(1)
        .listen(listener)
        .unwrap()
        .run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        Relay {
            url,
            received,
            handle,
        }
    }

    fn notice() -> Notification {
        Notification {
            kind: NotificationKind::Approval,
            username: "alice".to_string(),
            to: vec!["alice@x.com".to_string()],
            subject: "RyseTor account approved".to_string(),
            body: "Welcome aboard".to_string(),
        }
    }

    fn mailer(url: String) -> WebhookMailer {
        WebhookMailer::new(url, "noreply@rysetor.org".to_string()).unwrap()
    }

    #[actix_web::test]
    async fn posts_the_message_as_json() {
        let relay = relay(StatusCode::OK);

        mailer(relay.url.clone()).deliver(&notice()).await.unwrap();

        let received = relay.received.lock().unwrap().clone();
        assert_eq!(
            received,
            vec![json!({
                "from": "noreply@rysetor.org",
                "to": ["alice@x.com"],
                "subject": "RyseTor account approved",
                "body": "Welcome aboard",
                "kind": "approval",
                "username": "alice",
            })]
        );
        relay.handle.stop(false).await;
    }

    #[actix_web::test]
    async fn client_errors_are_rejections() {
        let relay = relay(StatusCode::UNPROCESSABLE_ENTITY);

        let result = mailer(relay.url.clone()).deliver(&notice()).await;

        assert!(matches!(result, Err(NotifyError::Rejected(msg)) if msg.contains("422")));
        relay.handle.stop(false).await;
    }

    #[actix_web::test]
    async fn server_errors_are_transport_failures() {
        let relay = relay(StatusCode::SERVICE_UNAVAILABLE);

        let result = mailer(relay.url.clone()).deliver(&notice()).await;

        assert!(matches!(result, Err(NotifyError::Transport(msg)) if msg.contains("503")));
        relay.handle.stop(false).await;
    }

    #[actix_web::test]
    async fn unreachable_relay_is_a_transport_failure() {
        let url = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            format!("http://{}/send", listener.local_addr().unwrap())
        };

        let result = mailer(url).deliver(&notice()).await;

        assert!(matches!(result, Err(NotifyError::Transport(_))));
    }
}
