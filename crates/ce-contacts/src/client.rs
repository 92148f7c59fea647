//! CardDAV client implementation

use crate::error::{ContactsError, Result};
use crate::listing::parse_listing;
use crate::models::ContactsConfig;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use tracing::{debug, error, info};

/// Body of the member listing request. `getetag` is the smallest property
/// every CardDAV server returns for an existing vCard.
const PROPFIND_BODY: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
<d:propfind xmlns:d="DAV:">
    <d:prop>
        <d:getetag/>
    </d:prop>
</d:propfind>"#;

/// CardDAV client for contact export
pub struct ContactsClient {
    client: Client,
    config: ContactsConfig,
}

impl ContactsClient {
    /// Create a new CardDAV client
    pub fn new(config: ContactsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ContactsError::Configuration(e.to_string()))?;

        info!("Contacts client initialized for: {}", config.collection_url);

        Ok(Self { client, config })
    }

    /// List the hrefs of every contact in the address book.
    ///
    /// A non-success status on the PROPFIND is logged and treated as an
    /// empty address book. Transport failures and unparsable bodies are
    /// returned as errors.
    pub async fn list_contacts(&self) -> Result<Vec<String>> {
        let url = &self.config.collection_url;
        let propfind = Method::from_bytes(b"PROPFIND")
            .map_err(|e| ContactsError::Configuration(e.to_string()))?;

        debug!("Listing contacts at: {}", url);

        let response = self
            .client
            .request(propfind, url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .header(CONTENT_TYPE, "application/xml; charset=utf-8")
            .header("Depth", "1")
            .body(PROPFIND_BODY)
            .send()
            .await
            .map_err(|e| ContactsError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Failed to fetch contacts list: {} - {}", status, error_text);
            return Ok(Vec::new());
        }

        let text = response
            .text()
            .await
            .map_err(|e| ContactsError::HttpError(e.to_string()))?;
        debug!("Raw XML response:\n{}", text);

        let hrefs = parse_listing(&text)?;
        for href in &hrefs {
            info!("Valid contact URL found: {}", href);
        }
        info!("Found {} contacts", hrefs.len());

        Ok(hrefs)
    }

    /// Absolute URL for a listed href
    pub fn contact_url(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            return href.to_string();
        }

        format!("{}/{}", self.config.host, href.trim_start_matches('/'))
    }

    /// Download one vCard and return the raw body.
    ///
    /// Failures are returned, not logged; the caller decides how to report a
    /// skipped contact.
    pub async fn fetch_vcard(&self, href: &str) -> Result<String> {
        let url = self.contact_url(href);

        debug!("Fetching contact from: {}", url);

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .await
            .map_err(|e| ContactsError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ContactsError::CarddavError(format!(
                "Request failed: {} - {}",
                status, error_text
            )));
        }

        response
            .text()
            .await
            .map_err(|e| ContactsError::HttpError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{basic_auth, body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LISTING: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<d:multistatus xmlns:d="DAV:">
  <d:response>
    <d:href>/book/a.vcf</d:href>
    <d:propstat><d:prop><d:getetag>"1"</d:getetag></d:prop><d:status>HTTP/1.1 200 OK</d:status></d:propstat>
  </d:response>
  <d:response>
    <d:href>/book/b.vcf</d:href>
    <d:propstat><d:prop><d:getetag>"2"</d:getetag></d:prop><d:status>HTTP/1.1 200 OK</d:status></d:propstat>
  </d:response>
</d:multistatus>"#;

    fn client_for(server: &MockServer) -> ContactsClient {
        let config = ContactsConfig::new(
            format!("{}/book/", server.uri()),
            server.uri(),
            "me@example.com",
            "app-password",
        );
        ContactsClient::new(config).unwrap()
    }

    #[test]
    fn test_contact_url() {
        let config = ContactsConfig::new(
            "https://www.google.com/carddav/v1/principals/me/lists/default/",
            "https://www.google.com",
            "me",
            "pw",
        );
        let client = ContactsClient::new(config).unwrap();

        assert_eq!(
            client.contact_url("/carddav/v1/principals/me/lists/default/abc"),
            "https://www.google.com/carddav/v1/principals/me/lists/default/abc"
        );
        assert_eq!(client.contact_url("abc.vcf"), "https://www.google.com/abc.vcf");
        assert_eq!(
            client.contact_url("https://other.example.com/x.vcf"),
            "https://other.example.com/x.vcf"
        );
    }

    #[tokio::test]
    async fn test_list_contacts_sends_propfind() {
        let server = MockServer::start().await;

        Mock::given(method("PROPFIND"))
            .and(path("/book/"))
            .and(header("Depth", "1"))
            .and(basic_auth("me@example.com", "app-password"))
            .and(body_string_contains("getetag"))
            .respond_with(ResponseTemplate::new(207).set_body_string(LISTING))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let hrefs = client.list_contacts().await.unwrap();

        assert_eq!(hrefs, vec!["/book/a.vcf", "/book/b.vcf"]);
    }

    #[tokio::test]
    async fn test_list_contacts_unauthorized_is_empty() {
        let server = MockServer::start().await;

        Mock::given(method("PROPFIND"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let hrefs = client.list_contacts().await.unwrap();

        assert!(hrefs.is_empty());
    }

    #[tokio::test]
    async fn test_list_contacts_malformed_body() {
        let server = MockServer::start().await;

        Mock::given(method("PROPFIND"))
            .respond_with(ResponseTemplate::new(207).set_body_string("<d:multistatus xmlns:d=\"DAV:\"><d:response>"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client.list_contacts().await;

        assert!(matches!(result, Err(ContactsError::XmlParseError(_))));
    }

    #[tokio::test]
    async fn test_list_contacts_connection_refused() {
        let uri = "http://127.0.0.1:1";
        let config = ContactsConfig::new(format!("{}/book/", uri), uri, "me", "pw");
        let client = ContactsClient::new(config).unwrap();

        let result = client.list_contacts().await;
        assert!(matches!(result, Err(ContactsError::Connection(_))));
    }

    #[tokio::test]
    async fn test_fetch_vcard_success() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/book/a.vcf"))
            .and(basic_auth("me@example.com", "app-password"))
            .respond_with(ResponseTemplate::new(200).set_body_string("BEGIN:VCARD\r\nEND:VCARD\r\n"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let body = client.fetch_vcard("/book/a.vcf").await.unwrap();

        assert_eq!(body, "BEGIN:VCARD\r\nEND:VCARD\r\n");
    }

    #[tokio::test]
    async fn test_fetch_vcard_server_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/book/a.vcf"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client.fetch_vcard("/book/a.vcf").await;

        match result {
            Err(ContactsError::CarddavError(msg)) => {
                assert!(msg.contains("500"));
                assert!(msg.contains("boom"));
            }
            other => panic!("Expected CarddavError, got: {:?}", other),
        }
    }
}
