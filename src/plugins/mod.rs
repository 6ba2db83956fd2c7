//! Built-in plugins.
//!
//! Each one is an ordinary [`Plugin`]: it subscribes to lifecycle events
//! and can be switched off with `enabled = false` in its
//! `[plugins.<name>]` section.
//!
//! | Plugin | Event | Effect |
//! |---|---|---|
//! | `featured_images` | `AFTER_ARTICLE_PARSER_RUN` | picks the featured, og, twitter and rss images |
//! | `related` | `AFTER_PARSE_LATE` | ranks other articles by shared taxonomy values |
//! | `schema` | `ARTICLE_PRERENDER` | builds the schema.org JSON-LD payload |

pub mod featured_images;
pub mod related;
pub mod schema;

use crate::events::Plugin;

/// Every built-in plugin, in registration order.
pub fn builtin() -> Vec<Box<dyn Plugin>> {
    vec![
        Box::new(featured_images::FeaturedImages),
        Box::new(related::Related),
        Box::new(schema::Schema),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::events::{Event, EventBus, register_plugins};

    #[test]
    fn builtins_subscribe_to_their_events() {
        let mut bus = EventBus::new();
        let mut config = SiteConfig::default();
        let loaded = register_plugins(&mut bus, &mut config, &builtin()).unwrap();
        assert_eq!(loaded, vec!["featured_images", "related", "schema"]);
        assert_eq!(bus.subscribers(Event::AfterArticleParserRun), vec!["featured_images"]);
        assert_eq!(bus.subscribers(Event::AfterParseLate), vec!["related"]);
        assert_eq!(bus.subscribers(Event::ArticlePrerender), vec!["schema"]);
        assert!(config.plugins.contains_key("related"));
    }

    #[test]
    fn builtin_can_be_disabled() {
        let mut bus = EventBus::new();
        let mut config = SiteConfig::default();
        config.plugins.insert(
            "related".into(),
            toml::Value::Table("enabled = false".parse::<toml::Table>().unwrap()),
        );
        let loaded = register_plugins(&mut bus, &mut config, &builtin()).unwrap();
        assert!(!loaded.contains(&"related"));
        assert_eq!(bus.handler_count(Event::AfterParseLate), 0);
    }
}
