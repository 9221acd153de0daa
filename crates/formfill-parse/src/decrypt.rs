//! In-process decryption with lopdf.
//!
//! Government forms are usually "owner-password" protected: they open without
//! a password but restrict editing. Decrypting with the empty user password
//! and dropping `/Encrypt` yields a plain copy the filler can modify.

use crate::error::BackendError;

/// Decrypt PDF bytes with the empty user password.
///
/// Unencrypted input is re-serialized unchanged. The result never carries an
/// `/Encrypt` dictionary.
///
/// # Errors
///
/// Returns [`BackendError::Parse`] when the bytes are not a PDF,
/// [`BackendError::Decrypt`] when the document needs a user password, and
/// [`BackendError::Write`] when the plain copy cannot be serialized.
pub fn decrypt_document(bytes: &[u8]) -> Result<Vec<u8>, BackendError> {
    let mut doc = lopdf::Document::load_mem(bytes)
        .map_err(|e| BackendError::Parse(format!("failed to parse PDF: {e}")))?;

    // The loader opens owner-only documents with the empty password and
    // drops /Encrypt itself. A remaining /Encrypt means a user password.
    if doc.is_encrypted() {
        doc.decrypt("")
            .map_err(|e| BackendError::Decrypt(format!("empty user password rejected: {e}")))?;
        if let Ok(encrypt_id) = doc.trailer.get(b"Encrypt").and_then(lopdf::Object::as_reference) {
            doc.objects.remove(&encrypt_id);
        }
        doc.trailer.remove(b"Encrypt");
    }
    if doc.encryption_state.take().is_some() {
        #[cfg(feature = "tracing")]
        tracing::debug!(objects = doc.objects.len(), "removed document encryption");
    }

    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| BackendError::Write(format!("failed to save decrypted PDF: {e}")))?;
    Ok(buf)
}
