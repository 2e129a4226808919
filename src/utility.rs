use std::io::BufReader;
use std::iter;
use std::path::Path;
use std::sync::Arc;

use rustls::{ClientConfig, RootCertStore};
use rustls_pemfile::{read_one, Item};
use serde_json::Value;

use crate::config::Config;
use crate::prelude::UResult;

/// Reads every X509 certificate from a PEM bundle, skipping other items
pub fn load_x509_certs(crt_path: &Path) -> UResult<Vec<Vec<u8>>> {
    let cert_file = std::fs::File::open(crt_path)?;
    let mut cert_reader = BufReader::new(cert_file);

    let mut certs = Vec::new();
    for item in iter::from_fn(|| read_one(&mut cert_reader).transpose()) {
        match item? {
            Item::X509Certificate(cert) => certs.push(cert),
            _ => continue,
        }
    }
    if certs.is_empty() {
        return Err(format!("No certificates found in {}", crt_path.display()).into());
    }
    Ok(certs)
}

pub fn load_root_store(config: &Config) -> UResult<RootCertStore> {
    let certs = load_x509_certs(&config.ca_bundle_path)?;
    let mut roots = RootCertStore::empty();
    let (added, _ignored) = roots.add_parsable_certificates(&certs);
    if added == 0 {
        return Err("CA bundle contained no usable trust anchors".into());
    }
    Ok(roots)
}

pub fn create_client_config(config: &Config) -> UResult<Arc<ClientConfig>> {
    let roots = load_root_store(config)?;
    Ok(Arc::new(
        ClientConfig::builder()
            .with_safe_defaults()
            .with_root_certificates(roots)
            .with_no_client_auth(),
    ))
}

/// Cuts a string down to at most `max` characters
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Human readable name of a Telegram user object
pub fn format_user_name(user: &Value) -> String {
    let first = user.get("first_name").and_then(Value::as_str).unwrap_or("");
    let last = user.get("last_name").and_then(Value::as_str).unwrap_or("");
    let full = format!("{} {}", first, last).trim().to_owned();
    match user.get("username").and_then(Value::as_str) {
        Some(nick) if full.is_empty() => format!("@{}", nick),
        Some(nick) => format!("{} (@{})", full, nick),
        None if full.is_empty() => "Unknown".to_owned(),
        None => full,
    }
}
