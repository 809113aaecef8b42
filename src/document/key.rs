//! Fixed directive and keyword tables

use serde::Serialize;
use std::fmt;

/// Directive names understood by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Server,
    Listen,
    ServerName,
    ClientMaxBodySize,
    ErrorPage,
    Root,
    Index,
    Autoindex,
    Return,
    Location,
    AllowedMethods,
    UploadStore,
    Cgi,
    CgiTimeout,
    CgiExtension,
    Define,
    Include,
}

const KEYS: &[(&str, Key)] = &[
    ("server", Key::Server),
    ("listen", Key::Listen),
    ("server_name", Key::ServerName),
    ("client_max_body_size", Key::ClientMaxBodySize),
    ("error_page", Key::ErrorPage),
    ("root", Key::Root),
    ("index", Key::Index),
    ("autoindex", Key::Autoindex),
    ("return", Key::Return),
    ("location", Key::Location),
    ("allowed_methods", Key::AllowedMethods),
    ("upload_store", Key::UploadStore),
    ("cgi", Key::Cgi),
    ("cgi_timeout", Key::CgiTimeout),
    ("cgi_extension", Key::CgiExtension),
    ("define", Key::Define),
    ("include", Key::Include),
];

impl Key {
    pub fn from_name(name: &str) -> Option<Key> {
        KEYS.iter().find(|(n, _)| *n == name).map(|(_, key)| *key)
    }

    /// Name as written in configuration files
    pub fn name(self) -> &'static str {
        KEYS.iter()
            .find(|(_, key)| *key == self)
            .map(|(name, _)| *name)
            .unwrap_or("unknown")
    }

    /// All directive names, in table order
    pub fn names() -> impl Iterator<Item = &'static str> {
        KEYS.iter().map(|(name, _)| *name)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Bare words that carry meaning as arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Keyword {
    On,
    Off,
    True,
    False,
    Default,
    Enable,
    Disable,
    Auto,
}

const KEYWORDS: &[(&str, Keyword)] = &[
    ("on", Keyword::On),
    ("off", Keyword::Off),
    ("true", Keyword::True),
    ("false", Keyword::False),
    ("default", Keyword::Default),
    ("enable", Keyword::Enable),
    ("disable", Keyword::Disable),
    ("auto", Keyword::Auto),
];

impl Keyword {
    pub fn from_word(word: &str) -> Option<Keyword> {
        KEYWORDS
            .iter()
            .find(|(w, _)| *w == word)
            .map(|(_, keyword)| *keyword)
    }

    pub fn as_str(self) -> &'static str {
        KEYWORDS
            .iter()
            .find(|(_, keyword)| *keyword == self)
            .map(|(word, _)| *word)
            .unwrap_or("unknown")
    }

    /// Boolean meaning of the keyword, if it has one
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Keyword::On | Keyword::True | Keyword::Enable => Some(true),
            Keyword::Off | Keyword::False | Keyword::Disable => Some(false),
            Keyword::Default | Keyword::Auto => None,
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_table_round_trips_names() {
        for name in Key::names() {
            let key = Key::from_name(name).unwrap();
            assert_eq!(key.name(), name);
        }
        assert_eq!(Key::from_name("proxy_pass"), None);
        assert_eq!(Key::from_name("Server"), None);
    }

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(Keyword::from_word("on"), Some(Keyword::On));
        assert_eq!(Keyword::from_word("auto"), Some(Keyword::Auto));
        assert_eq!(Keyword::from_word("ON"), None);
        assert_eq!(Keyword::Enable.as_bool(), Some(true));
        assert_eq!(Keyword::Default.as_bool(), None);
    }
}
