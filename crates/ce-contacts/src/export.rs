//! Combined vCard export
//!
//! Lists the address book once, then downloads each member in listing
//! order and appends it to a single `.vcf` file. A contact that fails to
//! download is skipped; the rest of the run carries on.

use std::path::Path;

use tokio::fs::{self, File};
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{info, warn};

use crate::client::ContactsClient;
use crate::error::Result;
use crate::models::ExportSummary;
use crate::vcard::normalize;

/// Fetch one contact and append it to `sink`.
///
/// Returns `Ok(false)` when the download failed and nothing was written.
/// Only write errors on the sink are returned as `Err`.
pub async fn save_contact<W>(client: &ContactsClient, href: &str, sink: &mut W) -> Result<bool>
where
    W: AsyncWrite + Unpin,
{
    let body = match client.fetch_vcard(href).await {
        Ok(body) => body,
        Err(e) => {
            warn!("Skipping contact {}: {}", href, e);
            return Ok(false);
        }
    };

    write_entry(sink, &normalize(&body)).await?;
    info!("Fetched and saved contact: {}", href);

    Ok(true)
}

/// One entry is the cleaned vCard followed by a blank line.
async fn write_entry<W>(sink: &mut W, vcard: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    sink.write_all(vcard.as_bytes()).await?;
    sink.write_all(b"\n\n").await
}

/// Export every contact into the file at `path`, replacing its contents.
pub async fn export_contacts(
    client: &ContactsClient,
    path: impl AsRef<Path>,
) -> Result<ExportSummary> {
    let path = path.as_ref();

    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).await?;
        }
    }

    let hrefs = client.list_contacts().await?;

    let file = File::create(path).await?;
    let mut sink = BufWriter::new(file);

    let mut saved = 0;
    for href in &hrefs {
        if save_contact(client, href, &mut sink).await? {
            saved += 1;
        }
    }

    sink.shutdown().await?;

    info!("All contacts saved to: {}", path.display());

    Ok(ExportSummary {
        listed: hrefs.len(),
        saved,
        skipped: hrefs.len() - saved,
        path: path.to_path_buf(),
    })
}
