//! # Quire
//!
//! A plugin-driven static site generator. Markdown files with YAML front
//! matter become typed articles; a fixed derivation pipeline fills in dates,
//! URLs, names, taxonomies and structured data; plugins hook the lifecycle;
//! handlebars layouts turn each article into a page.
//!
//! # Architecture: One Run, Ordered Phases
//!
//! ```text
//! 1. Config     config.toml  →  SiteConfig + plugins registered
//! 2. Images     content/     →  ImageRegistry      (variants, content-hash cache)
//! 3. Articles   content/     →  Site indices       (parallel derive, sequential commit)
//! 4. Listings   indices      →  pagination + taxonomy pages
//! 5. Render     Site         →  public/            (parallel, per-layout renderer)
//! ```
//!
//! Every phase boundary is a lifecycle event on the [`events::EventBus`].
//! Articles see the site read-only while they are derived, so the parallel
//! batch never races on the indices.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`build`] | The run orchestrator: phases, events, failure collection |
//! | [`config`] | `config.toml` loading, stock defaults, type rules, plugin sections |
//! | [`events`] | Lifecycle events, handler priorities, the [`events::Plugin`] trait |
//! | [`article`] | Article model, the builder and the derivation pipeline |
//! | [`site`] | The run context: config, registry and every index |
//! | [`collection`] | Ordered keyed collections and taxonomy indices |
//! | [`paginate`] | Paginated listings and per-term taxonomy pages |
//! | [`imaging`] | Image registry, responsive variants, the pixel backend |
//! | [`cache`] | SHA-256 content hashes and the image cache file |
//! | [`render`] | Renderer dispatch and the handlebars renderer |
//! | [`plugins`] | Built-in plugins: featured images, related articles, schema.org |
//! | [`front_matter`] | YAML front matter in content files and layout comments |
//! | [`markup`] | Multi-format prose fields: markdown, HTML and plain text |
//! | [`dates`] | Publish and modified date resolution |
//! | [`naming`] | Slugs, humanized names, date-prefix stripping |
//! | [`merge`] | Front matter layering |
//! | [`serve`] | Local preview server |
//! | [`output`] | CLI report formatting |
//!
//! # Design Decisions
//!
//! ## Handlebars Over Compiled Templates
//!
//! Layouts are site files, not part of the binary. A site author edits
//! `layouts/*.hbs` and rebuilds; layout front matter (in a leading HTML
//! comment) feeds defaults into every article that uses it. Renderers are
//! looked up by layout extension, so another engine slots in without
//! touching the pipeline.
//!
//! ## Content Hashes, Not Timestamps
//!
//! Image outputs are reused when the SHA-256 of the source matches the hash
//! recorded in the cache file. Touching a file, checking out a branch or
//! restoring a backup does not force a resize.

pub mod article;
pub mod build;
pub mod cache;
pub mod collection;
pub mod config;
pub mod dates;
pub mod events;
pub mod front_matter;
pub mod imaging;
pub mod markup;
pub mod merge;
pub mod naming;
pub mod output;
pub mod paginate;
pub mod plugins;
pub mod render;
pub mod serve;
pub mod site;

#[cfg(test)]
pub(crate) mod test_helpers;
