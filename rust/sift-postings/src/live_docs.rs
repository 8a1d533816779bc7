use roaring::RoaringBitmap;

use crate::format::DocId;

/// Set of documents that are not deleted. Enumerators skip every document
/// for which [`is_live`](LiveDocs::is_live) returns false.
pub trait LiveDocs: Send + Sync {
    fn is_live(&self, doc: DocId) -> bool;
}

impl LiveDocs for RoaringBitmap {
    fn is_live(&self, doc: DocId) -> bool {
        self.contains(doc)
    }
}

impl LiveDocs for Vec<bool> {
    fn is_live(&self, doc: DocId) -> bool {
        self.get(doc as usize).copied().unwrap_or(false)
    }
}

impl LiveDocs for [bool] {
    fn is_live(&self, doc: DocId) -> bool {
        self.get(doc as usize).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use roaring::RoaringBitmap;

    use super::LiveDocs;

    #[test]
    fn test_live_docs() {
        let bitmap = RoaringBitmap::from_iter([1u32, 5, 9]);
        assert!(bitmap.is_live(5));
        assert!(!bitmap.is_live(6));

        let flags = vec![true, false, true];
        assert!(flags.is_live(0));
        assert!(!flags.is_live(1));
        assert!(!flags.is_live(3));
    }
}
