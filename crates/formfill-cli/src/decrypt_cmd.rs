use std::path::Path;

use formfill::Decryptor;

use crate::cli::DecryptorArg;
use crate::shared::{decrypt_backend, report_error, sibling_path};

pub fn run(source: &Path, cache: Option<&Path>, decryptor: DecryptorArg) -> Result<(), i32> {
    let cache = match cache {
        Some(path) => path.to_path_buf(),
        None => sibling_path(source, "decrypted")?,
    };
    let decryptor = Decryptor::new(source, cache, decrypt_backend(decryptor));

    let cached = decryptor.is_cached();
    let bytes = decryptor.decrypt().map_err(|e| report_error(&e))?;

    if cached {
        println!(
            "using existing {} ({} bytes)",
            decryptor.cache().display(),
            bytes.len()
        );
    } else {
        println!(
            "decrypted {} -> {} ({} bytes)",
            decryptor.source().display(),
            decryptor.cache().display(),
            bytes.len()
        );
    }
    Ok(())
}
