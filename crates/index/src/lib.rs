use config::limits::UNUSED;
use config::FilterTable;

/// Number of hash buckets. The hash is the low byte of the message id.
pub const HASH_TABLE_ENTRIES: usize = 256;
const HASH_MASK: u32 = 0x00FF;

/// Anything that maps a row index to a message id.
///
/// The index stores row numbers only; every lookup re-reads the id from the
/// table so that edits to a row never leave a stale copy behind.
pub trait MessageIds {
    fn message_id_at(&self, index: usize) -> Option<u32>;
    fn row_count(&self) -> usize;
}

impl MessageIds for FilterTable {
    fn message_id_at(&self, index: usize) -> Option<u32> {
        self.entries.get(index).map(|e| e.message_id)
    }

    fn row_count(&self) -> usize {
        self.entries.len()
    }
}

impl MessageIds for [u32] {
    fn message_id_at(&self, index: usize) -> Option<u32> {
        self.get(index).copied()
    }

    fn row_count(&self) -> usize {
        self.len()
    }
}

impl MessageIds for Vec<u32> {
    fn message_id_at(&self, index: usize) -> Option<u32> {
        self.as_slice().message_id_at(index)
    }

    fn row_count(&self) -> usize {
        self.len()
    }
}

/// One chain node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashLink {
    pub message_id: u32,
    pub filter_index: usize,
    pub next: Option<usize>,
}

/// Message id -> filter table row, as separate chains in an arena.
#[derive(Debug, Clone)]
pub struct FilterIndex {
    heads: [Option<usize>; HASH_TABLE_ENTRIES],
    links: Vec<HashLink>,
}

impl FilterIndex {
    pub fn new() -> Self {
        Self {
            heads: [None; HASH_TABLE_ENTRIES],
            links: Vec::new(),
        }
    }

    /// Builds an index over every used row of `table`.
    pub fn build<T: MessageIds + ?Sized>(table: &T) -> Self {
        let mut index = Self::new();
        index.rebuild(table);
        index
    }

    #[inline]
    pub fn hash(message_id: u32) -> usize {
        (message_id & HASH_MASK) as usize
    }

    /// Appends `(message_id, filter_index)` at the tail of its bucket chain.
    /// Returns the bucket.
    pub fn insert(&mut self, message_id: u32, filter_index: usize) -> usize {
        let bucket = Self::hash(message_id);
        let slot = self.links.len();
        self.links.push(HashLink {
            message_id,
            filter_index,
            next: None,
        });

        match self.heads[bucket] {
            None => self.heads[bucket] = Some(slot),
            Some(mut cur) => {
                while let Some(next) = self.links[cur].next {
                    cur = next;
                }
                self.links[cur].next = Some(slot);
            }
        }
        bucket
    }

    /// Row of `table` holding `message_id`, or `None`. The unused id never
    /// matches.
    pub fn lookup<T: MessageIds + ?Sized>(&self, table: &T, message_id: u32) -> Option<usize> {
        if message_id == UNUSED {
            return None;
        }
        let mut cur = self.heads[Self::hash(message_id)];
        while let Some(slot) = cur {
            let link = &self.links[slot];
            if table.message_id_at(link.filter_index) == Some(message_id) {
                return Some(link.filter_index);
            }
            cur = link.next;
        }
        None
    }

    /// Clears every chain and re-inserts each used row of `table` in order.
    /// Returns the number of rows indexed.
    pub fn rebuild<T: MessageIds + ?Sized>(&mut self, table: &T) -> usize {
        self.heads = [None; HASH_TABLE_ENTRIES];
        self.links.clear();

        for i in 0..table.row_count() {
            match table.message_id_at(i) {
                Some(id) if id != UNUSED => {
                    self.insert(id, i);
                }
                _ => {}
            }
        }
        self.links.len()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Links of one bucket, head first.
    pub fn chain(&self, bucket: usize) -> impl Iterator<Item = &HashLink> + '_ {
        let mut cur = self.heads.get(bucket).copied().flatten();
        std::iter::from_fn(move || {
            let slot = cur?;
            let link = &self.links[slot];
            cur = link.next;
            Some(link)
        })
    }
}

impl Default for FilterIndex {
    fn default() -> Self {
        Self::new()
    }
}
