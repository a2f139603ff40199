//! Auth session storage.

mod storage;
mod store;

pub use storage::{CredentialStorage, FileStorage, MemoryStorage, StoredAuth};
pub use store::AuthStore;

/// Masks a token for logs, keeping only the first and last four characters.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}
