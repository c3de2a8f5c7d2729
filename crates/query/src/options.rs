use bitflags::bitflags;

bitflags! {
    /// Options for a single fetch.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FetchOptions: u8 {
        /// Sort into document order and drop duplicates.
        const UNIQUE = 1;
        /// Walk each context's candidates nearest first.
        const REVERSE = 1 << 1;
        /// Evaluate once against the document node instead of every node of the set.
        const IGNORE_CONTEXT = 1 << 2;
        /// Keep the node that triggered the stop condition.
        const INCLUDE_STOP = 1 << 3;
        /// Sort even for a single context.
        const FORCE_SORT = 1 << 4;
    }
}

bitflags! {
    /// Options for [`NodeSet::find`](crate::NodeSet::find).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FindOptions: u8 {
        /// Treat an expression selector as a filter over all elements
        /// instead of as the query itself.
        const MODE_FILTER = 1;
        const FORCE_SORT = 1 << 1;
        /// Query the whole document even if the set holds nodes.
        const USE_DOCUMENT_CONTEXT = 1 << 2;
    }
}
