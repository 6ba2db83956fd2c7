//! Lifecycle events and the plugin host.
//!
//! A build moves through a fixed set of phases. At each boundary the
//! [`EventBus`] runs the handlers subscribed to that [`Event`], one at a
//! time in ascending priority (registration order breaks ties), so a later
//! handler always sees what an earlier one wrote.
//!
//! Events come in two scopes:
//!
//! | Scope | Events | Handler receives |
//! |---|---|---|
//! | Site | `AFTER_CONFIG`, `BEFORE_PARSE_EARLY`, `AFTER_PARSE_EARLY`, `BEFORE_PARSE_LATE`, `AFTER_PARSE_LATE` | `&mut Site` |
//! | Article | `AFTER_ARTICLE_PARSER_INIT`, `AFTER_ARTICLE_PARSER_RUN`, `ARTICLE_PRERENDER` | `&mut Article`, `&Site` |
//!
//! Subscribing to an unknown event name, or with a handler of the wrong
//! scope, fails at registration time with a [`ConfigError`].
//!
//! `emit` stops at the first handler error and returns it; the caller
//! decides whether that is fatal. See [`Event::is_structural`].

use crate::article::Article;
use crate::config::{ConfigError, SiteConfig};
use crate::site::Site;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_PRIORITY: i32 = 50;

#[derive(Error, Debug)]
pub enum PluginError {
    #[error("plugin {plugin}: {message}")]
    Failed { plugin: String, message: String },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl PluginError {
    pub fn failed(plugin: &str, message: impl Into<String>) -> Self {
        Self::Failed {
            plugin: plugin.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Event {
    AfterConfig,
    BeforeParseEarly,
    AfterParseEarly,
    BeforeParseLate,
    AfterParseLate,
    AfterArticleParserInit,
    AfterArticleParserRun,
    ArticlePrerender,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Site,
    Article,
}

impl Scope {
    fn label(self) -> &'static str {
        match self {
            Scope::Site => "site",
            Scope::Article => "article",
        }
    }
}

impl Event {
    pub const ALL: [Event; 8] = [
        Event::AfterConfig,
        Event::BeforeParseEarly,
        Event::AfterParseEarly,
        Event::BeforeParseLate,
        Event::AfterParseLate,
        Event::AfterArticleParserInit,
        Event::AfterArticleParserRun,
        Event::ArticlePrerender,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Event::AfterConfig => "AFTER_CONFIG",
            Event::BeforeParseEarly => "BEFORE_PARSE_EARLY",
            Event::AfterParseEarly => "AFTER_PARSE_EARLY",
            Event::BeforeParseLate => "BEFORE_PARSE_LATE",
            Event::AfterParseLate => "AFTER_PARSE_LATE",
            Event::AfterArticleParserInit => "AFTER_ARTICLE_PARSER_INIT",
            Event::AfterArticleParserRun => "AFTER_ARTICLE_PARSER_RUN",
            Event::ArticlePrerender => "ARTICLE_PRERENDER",
        }
    }

    pub fn scope(self) -> Scope {
        match self {
            Event::AfterArticleParserInit
            | Event::AfterArticleParserRun
            | Event::ArticlePrerender => Scope::Article,
            _ => Scope::Site,
        }
    }

    /// Handler failures on structural events abort the unit of work
    /// (the run for `AFTER_CONFIG`, the article for
    /// `AFTER_ARTICLE_PARSER_INIT`). Everything else is logged and the
    /// build continues.
    pub fn is_structural(self) -> bool {
        matches!(self, Event::AfterConfig | Event::AfterArticleParserInit)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Event {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Event::ALL
            .into_iter()
            .find(|e| e.name() == s)
            .ok_or_else(|| ConfigError::UnknownEvent(s.to_string()))
    }
}

pub type SiteHandler = Box<dyn Fn(&mut Site) -> Result<(), PluginError> + Send + Sync>;
pub type ArticleHandler =
    Box<dyn Fn(&mut Article, &Site) -> Result<(), PluginError> + Send + Sync>;

pub enum Handler {
    Site(SiteHandler),
    Article(ArticleHandler),
}

impl Handler {
    fn scope(&self) -> Scope {
        match self {
            Handler::Site(_) => Scope::Site,
            Handler::Article(_) => Scope::Article,
        }
    }
}

struct Registration {
    priority: i32,
    plugin: String,
    handler: Handler,
}

/// Ordered handler lists, one per event.
#[derive(Default)]
pub struct EventBus {
    handlers: BTreeMap<Event, Vec<Registration>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `handler` to `event`.
    pub fn on(
        &mut self,
        event: Event,
        plugin: &str,
        handler: Handler,
        priority: i32,
    ) -> Result<(), ConfigError> {
        if handler.scope() != event.scope() {
            return Err(ConfigError::EventScope {
                event: event.name(),
                expected: event.scope().label(),
            });
        }
        let list = self.handlers.entry(event).or_default();
        // After every registration with an equal or lower priority.
        let at = list.partition_point(|r| r.priority <= priority);
        list.insert(
            at,
            Registration {
                priority,
                plugin: plugin.to_string(),
                handler,
            },
        );
        Ok(())
    }

    /// Subscribe by event name, as written in plugin configuration.
    pub fn on_named(
        &mut self,
        event: &str,
        plugin: &str,
        handler: Handler,
        priority: Option<i32>,
    ) -> Result<(), ConfigError> {
        let event: Event = event.parse()?;
        self.on(event, plugin, handler, priority.unwrap_or(DEFAULT_PRIORITY))
    }

    pub fn on_site<F>(
        &mut self,
        event: Event,
        plugin: &str,
        priority: i32,
        f: F,
    ) -> Result<(), ConfigError>
    where
        F: Fn(&mut Site) -> Result<(), PluginError> + Send + Sync + 'static,
    {
        self.on(event, plugin, Handler::Site(Box::new(f)), priority)
    }

    pub fn on_article<F>(
        &mut self,
        event: Event,
        plugin: &str,
        priority: i32,
        f: F,
    ) -> Result<(), ConfigError>
    where
        F: Fn(&mut Article, &Site) -> Result<(), PluginError> + Send + Sync + 'static,
    {
        self.on(event, plugin, Handler::Article(Box::new(f)), priority)
    }

    pub fn handler_count(&self, event: Event) -> usize {
        self.handlers.get(&event).map_or(0, Vec::len)
    }

    /// Plugin names subscribed to `event`, in dispatch order.
    pub fn subscribers(&self, event: Event) -> Vec<&str> {
        self.handlers
            .get(&event)
            .map(|list| list.iter().map(|r| r.plugin.as_str()).collect())
            .unwrap_or_default()
    }

    /// Run site-scoped handlers in order, stopping at the first error.
    pub fn emit_site(&self, event: Event, site: &mut Site) -> Result<(), PluginError> {
        for reg in self.handlers.get(&event).into_iter().flatten() {
            if let Handler::Site(handler) = &reg.handler {
                tracing::trace!(event = %event, plugin = %reg.plugin, "dispatch");
                handler(site)?;
            }
        }
        Ok(())
    }

    /// Run article-scoped handlers in order, stopping at the first error.
    pub fn emit_article(
        &self,
        event: Event,
        article: &mut Article,
        site: &Site,
    ) -> Result<(), PluginError> {
        for reg in self.handlers.get(&event).into_iter().flatten() {
            if let Handler::Article(handler) = &reg.handler {
                tracing::trace!(event = %event, plugin = %reg.plugin, path = %article.rel_path, "dispatch");
                handler(article, site)?;
            }
        }
        Ok(())
    }
}

/// A unit that subscribes handlers to lifecycle events.
pub trait Plugin: Send + Sync {
    /// Namespace for `[plugins.<name>]` and `Article::extensions`.
    fn name(&self) -> &'static str;

    /// Defaults merged under `[plugins.<name>]` before registration, with
    /// the user's values winning.
    fn default_config(&self) -> Option<toml::Value> {
        None
    }

    fn register(&self, bus: &mut EventBus, config: &SiteConfig) -> Result<(), PluginError>;
}

/// Merge each plugin's defaults into the config, then let it subscribe.
///
/// A plugin whose section sets `enabled = false` is skipped.
pub fn register_plugins(
    bus: &mut EventBus,
    config: &mut SiteConfig,
    plugins: &[Box<dyn Plugin>],
) -> Result<Vec<&'static str>, PluginError> {
    let mut loaded = Vec::new();
    for plugin in plugins {
        if let Some(defaults) = plugin.default_config() {
            config.merge_section(plugin.name(), defaults);
        }
        let enabled = config
            .plugins
            .get(plugin.name())
            .and_then(|section| section.get("enabled"))
            .and_then(toml::Value::as_bool)
            .unwrap_or(true);
        if !enabled {
            tracing::debug!(plugin = plugin.name(), "disabled");
            continue;
        }
        plugin.register(bus, config)?;
        loaded.push(plugin.name());
    }
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{bare_article, bare_site};
    use std::sync::{Arc, Mutex};

    fn recorder(log: &Arc<Mutex<Vec<String>>>, label: &str) -> SiteHandler {
        let log = Arc::clone(log);
        let label = label.to_string();
        Box::new(move |_site: &mut Site| {
            log.lock().unwrap().push(label.clone());
            Ok(())
        })
    }

    #[test]
    fn event_names_roundtrip() {
        for event in Event::ALL {
            assert_eq!(event.name().parse::<Event>().unwrap(), event);
        }
    }

    #[test]
    fn unknown_event_fails_at_subscribe() {
        let mut bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let err = bus
            .on_named("AFTER_LUNCH", "p", Handler::Site(recorder(&log, "x")), None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownEvent(name) if name == "AFTER_LUNCH"));
    }

    #[test]
    fn wrong_scope_fails_at_subscribe() {
        let mut bus = EventBus::new();
        let err = bus
            .on_article(Event::AfterConfig, "p", 50, |_, _| Ok(()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::EventScope { .. }));
    }

    #[test]
    fn handlers_run_by_ascending_priority_with_stable_ties() {
        let mut bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.on(Event::AfterParseLate, "p", Handler::Site(recorder(&log, "late")), 90)
            .unwrap();
        bus.on(Event::AfterParseLate, "p", Handler::Site(recorder(&log, "first-50")), 50)
            .unwrap();
        bus.on(Event::AfterParseLate, "p", Handler::Site(recorder(&log, "early")), 10)
            .unwrap();
        bus.on_named("AFTER_PARSE_LATE", "p", Handler::Site(recorder(&log, "second-50")), None)
            .unwrap();

        let mut site = bare_site();
        bus.emit_site(Event::AfterParseLate, &mut site).unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec!["early", "first-50", "second-50", "late"]
        );
    }

    #[test]
    fn later_handler_sees_earlier_mutation() {
        let mut bus = EventBus::new();
        bus.on_article(Event::AfterArticleParserRun, "a", 10, |article, _| {
            article.description = Some("set by first".into());
            Ok(())
        })
        .unwrap();
        bus.on_article(Event::AfterArticleParserRun, "b", 20, |article, _| {
            let seen = article.description.clone().unwrap_or_default();
            article.headline = format!("saw: {seen}");
            Ok(())
        })
        .unwrap();

        let site = bare_site();
        let mut article = bare_article("a.md");
        bus.emit_article(Event::AfterArticleParserRun, &mut article, &site)
            .unwrap();
        assert_eq!(article.headline, "saw: set by first");
    }

    #[test]
    fn first_error_stops_dispatch() {
        let mut bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.on_site(Event::BeforeParseLate, "bad", 10, |_| {
            Err(PluginError::failed("bad", "boom"))
        })
        .unwrap();
        bus.on(Event::BeforeParseLate, "p", Handler::Site(recorder(&log, "never")), 20)
            .unwrap();

        let mut site = bare_site();
        let err = bus.emit_site(Event::BeforeParseLate, &mut site).unwrap_err();
        assert!(err.to_string().contains("boom"));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn emit_without_handlers_is_ok() {
        let bus = EventBus::new();
        let mut site = bare_site();
        assert!(bus.emit_site(Event::AfterConfig, &mut site).is_ok());
        assert_eq!(bus.handler_count(Event::AfterConfig), 0);
    }

    fn table(src: &str) -> toml::Value {
        toml::Value::Table(src.parse::<toml::Table>().unwrap())
    }

    struct Counter;

    impl Plugin for Counter {
        fn name(&self) -> &'static str {
            "counter"
        }

        fn default_config(&self) -> Option<toml::Value> {
            Some(table("step = 1\nenabled = true"))
        }

        fn register(&self, bus: &mut EventBus, config: &SiteConfig) -> Result<(), PluginError> {
            let step = config.plugins["counter"]
                .get("step")
                .and_then(toml::Value::as_integer)
                .unwrap_or(0);
            bus.on_site(Event::AfterConfig, self.name(), DEFAULT_PRIORITY, move |site| {
                site.config.site.description = format!("step {step}");
                Ok(())
            })?;
            Ok(())
        }
    }

    #[test]
    fn register_plugins_preserves_user_values() {
        let mut bus = EventBus::new();
        let mut config = SiteConfig::default();
        config
            .plugins
            .insert("counter".into(), table("step = 7"));

        let plugins: Vec<Box<dyn Plugin>> = vec![Box::new(Counter)];
        let loaded = register_plugins(&mut bus, &mut config, &plugins).unwrap();
        assert_eq!(loaded, vec!["counter"]);
        assert_eq!(bus.subscribers(Event::AfterConfig), vec!["counter"]);

        let mut site = bare_site();
        bus.emit_site(Event::AfterConfig, &mut site).unwrap();
        assert_eq!(site.config.site.description, "step 7");
    }

    #[test]
    fn disabled_plugin_is_skipped() {
        let mut bus = EventBus::new();
        let mut config = SiteConfig::default();
        config
            .plugins
            .insert("counter".into(), table("enabled = false"));

        let plugins: Vec<Box<dyn Plugin>> = vec![Box::new(Counter)];
        let loaded = register_plugins(&mut bus, &mut config, &plugins).unwrap();
        assert!(loaded.is_empty());
        assert_eq!(bus.handler_count(Event::AfterConfig), 0);
    }
}
