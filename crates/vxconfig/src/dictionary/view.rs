use super::{Dictionary, DictionaryEntry, EntryValue};

/// A dictionary together with its enclosing scopes, innermost first.
#[derive(Debug, Clone)]
pub struct DictView<'a> {
    chain: Vec<&'a Dictionary>,
}

impl<'a> DictView<'a> {
    pub fn new(dict: &'a Dictionary) -> Self {
        Self { chain: vec![dict] }
    }

    /// View over `scopes`, innermost first.
    pub fn from_chain(scopes: Vec<&'a Dictionary>) -> Self {
        Self { chain: scopes }
    }

    /// View of `dict` nested inside this one.
    pub fn child(&self, dict: &'a Dictionary) -> Self {
        let mut chain = Vec::with_capacity(self.chain.len() + 1);
        chain.push(dict);
        chain.extend_from_slice(&self.chain);
        Self { chain }
    }

    pub fn parent(&self) -> Option<Self> {
        (self.chain.len() > 1).then(|| Self {
            chain: self.chain[1..].to_vec(),
        })
    }

    pub fn dictionary(&self) -> Option<&'a Dictionary> {
        self.chain.first().copied()
    }

    pub fn depth(&self) -> usize {
        self.chain.len()
    }

    /// First entry named `name` walking outward; also returns the position
    /// in the chain where it was found.
    fn find(&self, name: &str) -> Option<(usize, &'a DictionaryEntry)> {
        self.chain
            .iter()
            .copied()
            .enumerate()
            .find_map(|(k, dict)| dict.get(name).map(|e| (k, e)))
    }

    fn from_depth(&self, k: usize) -> Self {
        Self {
            chain: self.chain[k..].to_vec(),
        }
    }

    /// Resolve a plain or dotted name.
    ///
    /// For `a.b.c`, `a` and `b` must name dictionaries, each found from the
    /// scope reached so far; `c` is then searched from `b` outward. If that
    /// fails the whole name is tried again from the enclosing scope.
    pub fn lookup(&self, name: &str) -> Option<&'a DictionaryEntry> {
        self.resolve(name).map(|(_, e)| e)
    }

    /// Like [`lookup`](Self::lookup), also returning the view of the scope
    /// that holds the entry.
    pub fn resolve(&self, name: &str) -> Option<(DictView<'a>, &'a DictionaryEntry)> {
        let Some((prefix, stub)) = name.rsplit_once('.') else {
            return self.find(name).map(|(k, e)| (self.from_depth(k), e));
        };

        self.resolve_dotted(prefix, stub)
            .or_else(|| self.parent()?.resolve(name))
    }

    fn resolve_dotted(
        &self,
        prefix: &str,
        stub: &str,
    ) -> Option<(DictView<'a>, &'a DictionaryEntry)> {
        let mut view = self.clone();
        for component in prefix.split('.') {
            let (k, entry) = view.find(component)?;
            let EntryValue::Dict(sub) = &entry.value else {
                return None;
            };
            view = view.from_depth(k).child(sub);
        }
        view.find(stub).map(|(k, e)| (view.from_depth(k), e))
    }
}
