//! Representative image selection.
//!
//! For each purpose the first image tagged for it wins, resizeable images
//! before standard ones. `featured` falls back to the first resizeable
//! image, then the first image of any kind, then `site.default_image`. The
//! other purposes back-fill from it in a chain:
//!
//! ```text
//! featured → og → twitter
//!               → rss
//! ```

use crate::article::{Article, ArticleImage, ResolvedImage};
use crate::events::{DEFAULT_PRIORITY, Event, EventBus, Plugin, PluginError};
use crate::config::SiteConfig;
use crate::imaging::ImageEntry;
use crate::site::Site;

pub struct FeaturedImages;

impl Plugin for FeaturedImages {
    fn name(&self) -> &'static str {
        "featured_images"
    }

    fn register(&self, bus: &mut EventBus, _config: &SiteConfig) -> Result<(), PluginError> {
        bus.on_article(
            Event::AfterArticleParserRun,
            self.name(),
            DEFAULT_PRIORITY,
            |article, site| {
                select_images(article, site);
                Ok(())
            },
        )?;
        Ok(())
    }
}

fn resolve(image: &ArticleImage, entry: &ImageEntry, site: &Site) -> ResolvedImage {
    let (width, height) = match entry.largest() {
        Some(v) => (v.width, v.height),
        None => (entry.width, entry.height),
    };
    ResolvedImage {
        url: site.absolute_url(&entry.url()),
        width,
        height,
        srcset: entry.srcset(),
        alt: image.alt.clone().or_else(|| image.caption.clone()),
    }
}

/// Images paired with their registry entries, in article order.
fn known<'a>(article: &'a Article, site: &'a Site) -> Vec<(&'a ArticleImage, &'a ImageEntry)> {
    article
        .images
        .iter()
        .filter_map(|i| site.images.get(&i.src).map(|e| (i, e)))
        .collect()
}

fn tagged<'a>(
    images: &[(&'a ArticleImage, &'a ImageEntry)],
    purpose: &str,
) -> Option<(&'a ArticleImage, &'a ImageEntry)> {
    let mut candidates = images
        .iter()
        .filter(|(i, _)| i.tags.iter().any(|t| t == purpose));
    let first = candidates.clone().next().copied();
    candidates.find(|(_, e)| e.resizeable).copied().or(first)
}

fn default_image(site: &Site) -> Option<ResolvedImage> {
    let src = site.config.site.default_image.as_deref()?;
    Some(match site.images.get(src) {
        Some(entry) => resolve(&ArticleImage::default(), entry, site),
        None => ResolvedImage {
            url: site.absolute_url(src),
            width: 0,
            height: 0,
            srcset: String::new(),
            alt: None,
        },
    })
}

/// Fill `featured`, `og`, `twitter` and `rss`, keeping any already set.
pub fn select_images(article: &mut Article, site: &Site) {
    let images = known(article, site);
    let pick = |purpose: &str| tagged(&images, purpose).map(|(i, e)| resolve(i, e, site));

    let featured = article.featured.clone().or_else(|| {
        pick("featured")
            .or_else(|| {
                images
                    .iter()
                    .find(|(_, e)| e.resizeable)
                    .or_else(|| images.first())
                    .map(|(i, e)| resolve(i, e, site))
            })
            .or_else(|| default_image(site))
    });
    let og = article
        .og
        .clone()
        .or_else(|| pick("og"))
        .or_else(|| featured.clone());
    let twitter = article
        .twitter
        .clone()
        .or_else(|| pick("twitter"))
        .or_else(|| og.clone());
    let rss = article.rss.clone().or_else(|| pick("rss")).or_else(|| og.clone());

    if featured.is_none() {
        tracing::debug!(path = %article.rel_path, "no representative image");
    }
    article.featured = featured;
    article.og = og;
    article.twitter = twitter;
    article.rss = rss;
}
