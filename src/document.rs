//! The uploaded PDF as the pipeline sees it.

use std::fmt;
use std::sync::Arc;

/// How far into the file a `%PDF-` header may start.
///
/// Readers tolerate leading junk (mail headers, BOMs) before the header, as
/// long as it starts within the first kilobyte.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Raw bytes of one uploaded PDF.
///
/// Lives for exactly one conversion call. The buffer is reference counted so
/// it can be handed to a blocking render thread without copying.
#[derive(Clone)]
pub struct SourceDocument {
    bytes: Arc<[u8]>,
}

impl SourceDocument {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Shared handle to the underlying buffer.
    pub fn shared(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    /// Whether a `%PDF-` header appears near the start of the file.
    pub fn has_pdf_header(&self) -> bool {
        let window = &self.bytes[..self.bytes.len().min(HEADER_SEARCH_WINDOW)];
        window.windows(5).any(|w| w == b"%PDF-")
    }
}

impl From<Vec<u8>> for SourceDocument {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&[u8]> for SourceDocument {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes)
    }
}

impl fmt::Debug for SourceDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceDocument")
            .field("len", &self.bytes.len())
            .finish()
    }
}
