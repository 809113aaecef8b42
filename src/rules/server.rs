//! `server` blocks

use super::location::LocationConfig;
use super::types::{DefaultFlag, PortNumber, UrlPath};
use super::{Directive, ObjectBinder, RuleBinder};
use crate::diagnostics::Result;
use crate::document::{Arena, Key, ObjectId, RuleId};
use tracing::debug;

/// `server { ... }`
#[derive(Debug, Clone, Copy)]
pub struct Server {
    pub block: ObjectId,
}

impl Directive for Server {
    const KEY: Key = Key::Server;
    const FORMAT: &'static str = "server { ... }";

    fn from_rule(arena: &Arena, rule: RuleId) -> Result<Self> {
        let mut binder = RuleBinder::for_directive::<Self>(arena, rule);
        binder.expect_count(1)?;
        binder.next().map(|block| Self { block })
    }
}

/// `listen <port> [default];`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Listen {
    pub port: PortNumber,
    pub is_default: bool,
}

impl Directive for Listen {
    const KEY: Key = Key::Listen;
    const FORMAT: &'static str = "listen <port> [default];";

    fn from_rule(arena: &Arena, rule: RuleId) -> Result<Self> {
        let mut binder = RuleBinder::for_directive::<Self>(arena, rule);
        binder.expect_range(1, 2)?;
        let port = binder.next()?;
        let flag: Option<DefaultFlag> = binder.next_optional()?;
        Ok(Self {
            port,
            is_default: flag.is_some_and(|flag| flag.0),
        })
    }
}

/// `server_name <name>;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerName(pub String);

impl Directive for ServerName {
    const KEY: Key = Key::ServerName;
    const FORMAT: &'static str = "server_name <name>;";

    fn from_rule(arena: &Arena, rule: RuleId) -> Result<Self> {
        let mut binder = RuleBinder::for_directive::<Self>(arena, rule);
        binder.expect_count(1)?;
        binder.next().map(Self)
    }
}

/// One virtual server
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub listen: Listen,
    pub name: String,
    /// Settings of the server block itself; its nested locations are the
    /// server's `location` blocks
    pub default_location: LocationConfig,
}

impl ServerConfig {
    /// Bind every `server` directly under `root`
    pub fn from_document(arena: &Arena, root: ObjectId) -> Result<Vec<Self>> {
        let servers = ObjectBinder::new(arena, root)
            .local()
            .optional()
            .each::<Server>()?
            .into_iter()
            .map(|server| Self::from_object(arena, server.block))
            .collect::<Result<Vec<_>>>()?;
        debug!(servers = servers.len(), "bound server blocks");
        Ok(servers)
    }

    /// Bind the directives of a `server` block
    pub fn from_object(arena: &Arena, object: ObjectId) -> Result<Self> {
        let required = ObjectBinder::new(arena, object).local().required();
        let listen = required.expect::<Listen>()?;
        let ServerName(name) = required.expect::<ServerName>()?;
        let default_location = LocationConfig::from_object(arena, object, UrlPath::new("/"))?;

        Ok(Self {
            listen,
            name,
            default_location,
        })
    }

    pub fn locations(&self) -> &[LocationConfig] {
        &self.default_location.locations
    }

    /// Location serving `url`: the one with the longest matching prefix,
    /// or the server's own settings when none matches
    pub fn location_for(&self, url: &str) -> &LocationConfig {
        self.default_location.most_specific(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{Anchor, ErrorKind};
    use crate::parser::{ConfigParser, MemorySource};

    fn bind(content: &str) -> (ConfigParser, Result<Vec<ServerConfig>>) {
        let mut parser =
            ConfigParser::new().with_source(MemorySource::new().with_file("site.conf", content));
        let root = parser.parse_file("site.conf").unwrap();
        let servers = ServerConfig::from_document(parser.arena(), root);
        (parser, servers)
    }

    const SITE: &str = "\
server {
    listen 8080 default;
    server_name example.com;
    root /var/www;

    location /images {
        root /srv/images;
    }

    location /images/thumbs {
        autoindex on;
    }
}

server {
    listen 9090;
    server_name other.com;
}
";

    #[test]
    fn test_from_document() {
        let (_, servers) = bind(SITE);
        let servers = servers.unwrap();
        assert_eq!(servers.len(), 2);

        let first = &servers[0];
        assert_eq!(first.listen.port, PortNumber(8080));
        assert!(first.listen.is_default);
        assert_eq!(first.name, "example.com");
        assert_eq!(first.locations().len(), 2);

        assert!(!servers[1].listen.is_default);
        assert!(servers[1].locations().is_empty());
        assert_eq!(servers[1].location_for("/x").prefix.as_str(), "/");
    }

    #[test]
    fn test_location_for_picks_longest_prefix() {
        let (_, servers) = bind(SITE);
        let servers = servers.unwrap();
        let server = &servers[0];

        let thumbs = server.location_for("/images/thumbs/a.png");
        assert_eq!(thumbs.prefix.as_str(), "/images/thumbs");
        assert!(thumbs.autoindex);
        // inherited from the server block, not from the sibling location
        assert_eq!(thumbs.root, Some(UrlPath::new("/var/www")));

        let images = server.location_for("/images/cat.png");
        assert_eq!(
            images.resolve_path("/images/cat.png").unwrap().as_str(),
            "/srv/images/cat.png"
        );

        let fallback = server.location_for("/index.html");
        assert_eq!(fallback.prefix.as_str(), "/");
        assert_eq!(
            fallback.resolve_path("/index.html").unwrap().as_str(),
            "/var/www/index.html"
        );
    }

    #[test]
    fn test_binding_marks_rules_used() {
        let (parser, servers) = bind("server { listen 80; server_name a; }\nroot /unused;\n");
        servers.unwrap();
        let root = parser.object("site.conf").unwrap();
        let unused = parser.unused_rules(root);
        assert_eq!(unused.len(), 1);
        assert_eq!(parser.arena()[unused[0]].key, Key::Root);
    }

    #[test]
    fn test_missing_listen() {
        let (_, servers) = bind("server {\n    server_name a;\n}\n");
        let err = servers.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRule);
        assert_eq!(err.message(), "missing `listen` directive");
        match err.anchor() {
            Anchor::Missing { object: Some(bounds) } => {
                assert_eq!(bounds.open.to_string(), "site.conf:1:8");
                assert_eq!(bounds.close.as_ref().unwrap().to_string(), "site.conf:3:1");
            }
            other => panic!("unexpected anchor {other:?}"),
        }
    }

    #[test]
    fn test_listen_errors() {
        let cases: &[(&str, ErrorKind)] = &[
            ("listen 70000;", ErrorKind::ArgumentType),
            ("listen 80 always;", ErrorKind::ArgumentType),
            ("listen 80 default extra;", ErrorKind::ArgumentCount),
            ("listen 80; listen 81;", ErrorKind::DuplicateRule),
        ];
        for (body, kind) in cases {
            let (_, servers) = bind(&format!("server {{ server_name a; {body} }}"));
            assert_eq!(servers.unwrap_err().kind(), *kind, "for {body:?}");
        }
    }
}
