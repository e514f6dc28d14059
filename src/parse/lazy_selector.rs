use std::sync::OnceLock;

use scraper::Selector;

/// CSS selector compiled on first use and cached for the process lifetime.
#[derive(Debug)]
pub(super) struct LazySelector {
    source: &'static str,
    compiled: OnceLock<Selector>,
}

impl LazySelector {
    pub(super) const fn new(source: &'static str) -> Self {
        Self {
            source,
            compiled: OnceLock::new(),
        }
    }
}

impl core::ops::Deref for LazySelector {
    type Target = Selector;

    fn deref(&self) -> &Self::Target {
        self.compiled.get_or_init(|| {
            Selector::parse(self.source)
                .unwrap_or_else(|e| panic!("invalid selector {:?}: {e:?}", self.source))
        })
    }
}

#[macro_export]
macro_rules! static_selector {
    ($name: ident <- $sel: literal) => {
        static $name: $crate::parse::lazy_selector::LazySelector =
            $crate::parse::lazy_selector::LazySelector::new($sel);
    };
}
