/// Options of an update command.
///
/// * `upsert` inserts a document built from the filter and the update when
///   nothing matches.
/// * `just_once` updates only the first matching document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    upsert: bool,
    just_once: bool,
}

impl UpdateOptions {
    pub fn new(upsert: bool, just_once: bool) -> Self {
        Self { upsert, just_once }
    }

    pub fn is_upsert(&self) -> bool {
        self.upsert
    }

    pub fn is_just_once(&self) -> bool {
        self.just_once
    }
}

pub fn upsert() -> UpdateOptions {
    UpdateOptions::new(true, false)
}

pub fn just_once() -> UpdateOptions {
    UpdateOptions::new(false, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_options_default() {
        let options = UpdateOptions::default();
        assert!(!options.is_upsert());
        assert!(!options.is_just_once());
    }

    #[test]
    fn test_helpers() {
        assert!(upsert().is_upsert());
        assert!(!upsert().is_just_once());
        assert!(just_once().is_just_once());
        assert!(!just_once().is_upsert());
    }
}
