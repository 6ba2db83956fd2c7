//! schema.org JSON-LD emission.
//!
//! Runs right before rendering, once authors, taxonomies and images are
//! settled. The payload is an `@graph` holding the main entity, plus a
//! `BreadcrumbList` and a `FAQPage` when the article has them. Layouts
//! embed it with `{{{json page.schema}}}`.

use crate::article::Article;
use crate::config::SiteConfig;
use crate::events::{DEFAULT_PRIORITY, Event, EventBus, Plugin, PluginError};
use crate::paginate::LISTING_TYPE;
use crate::site::Site;
use serde_json::{Map, Value, json};

pub struct Schema;

impl Plugin for Schema {
    fn name(&self) -> &'static str {
        "schema"
    }

    fn register(&self, bus: &mut EventBus, _config: &SiteConfig) -> Result<(), PluginError> {
        bus.on_article(Event::ArticlePrerender, self.name(), DEFAULT_PRIORITY, |article, site| {
            article.schema = Some(build_schema(article, site));
            Ok(())
        })?;
        Ok(())
    }
}

fn entity_type(article: &Article) -> &'static str {
    if article.type_name == LISTING_TYPE || article.paging.is_some() {
        "CollectionPage"
    } else if article.type_name == "post" {
        "BlogPosting"
    } else if article.products.len() == 1 && !article.reviews.is_empty() {
        "Review"
    } else {
        "WebPage"
    }
}

fn insert_some(map: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    if let Some(v) = value {
        map.insert(key.to_string(), v);
    }
}

fn publisher(site: &Site) -> Option<Value> {
    let p = site.config.publisher.as_ref()?;
    let mut org = json!({"@type": "Organization", "name": p.name});
    if let Some(url) = &p.url {
        org["url"] = json!(url);
    }
    if let Some(logo) = &p.logo {
        org["logo"] = json!({"@type": "ImageObject", "url": site.absolute_url(logo)});
    }
    Some(org)
}

fn authors(article: &Article, site: &Site) -> Option<Value> {
    if article.authors.is_empty() {
        return None;
    }
    let list: Vec<Value> = article
        .authors
        .iter()
        .map(|a| {
            let mut person = json!({"@type": "Person", "name": a.name});
            if let Some(url) = &a.url {
                person["url"] = json!(site.absolute_url(url));
            }
            person
        })
        .collect();
    Some(Value::Array(list))
}

fn reviews(article: &Article, rel_path: &str) -> Option<Value> {
    if article.reviews.is_empty() {
        return None;
    }
    let list: Vec<Value> = article
        .reviews
        .iter()
        .map(|r| {
            let mut review = json!({"@type": "Review"});
            if let Some(name) = &r.name {
                review["name"] = json!(name);
            }
            if let Some(description) = &r.description {
                review["reviewBody"] = json!(description);
            }
            match r.rating {
                Some(rating) => {
                    review["reviewRating"] = json!({
                        "@type": "Rating",
                        "ratingValue": rating,
                        "bestRating": r.best_rating.unwrap_or(5.0),
                    });
                }
                None => tracing::info!(path = %rel_path, "review without rating"),
            }
            review
        })
        .collect();
    Some(Value::Array(list))
}

/// Build the JSON-LD payload for one article.
pub fn build_schema(article: &Article, site: &Site) -> Value {
    let url = site.absolute_url(&article.url);
    let mut main = Map::new();
    main.insert("@type".into(), json!(entity_type(article)));
    main.insert("@id".into(), json!(format!("{url}#main")));
    main.insert("url".into(), json!(url));
    main.insert("headline".into(), json!(article.headline));
    main.insert("name".into(), json!(article.name));
    insert_some(&mut main, "description", article.description.clone().map(Value::from));
    insert_some(
        &mut main,
        "inLanguage",
        article.fm_str("lang").map(|l| json!(l)),
    );
    insert_some(
        &mut main,
        "datePublished",
        article.date_published.as_ref().map(|d| json!(d.iso)),
    );
    insert_some(
        &mut main,
        "dateModified",
        article.date_modified.as_ref().map(|d| json!(d.iso)),
    );
    insert_some(&mut main, "author", authors(article, site));
    insert_some(&mut main, "publisher", publisher(site));
    insert_some(
        &mut main,
        "image",
        article.featured.as_ref().map(|img| {
            json!({"@type": "ImageObject", "url": img.url, "width": img.width, "height": img.height})
        }),
    );
    if !article.abstract_synthesized {
        insert_some(
            &mut main,
            "abstract",
            article.abstract_text.as_ref().map(|a| json!(a.text)),
        );
    }

    let keywords: Vec<&str> = article
        .taxonomies
        .get(&site.config.taxonomy.keyword_field)
        .into_iter()
        .flatten()
        .map(String::as_str)
        .collect();
    if !keywords.is_empty() {
        main.insert("keywords".into(), json!(keywords.join(", ")));
    }
    if !article.article_section.is_empty() {
        main.insert("articleSection".into(), json!(article.article_section));
    }
    if article.words > 0 {
        main.insert("wordCount".into(), json!(article.words));
        main.insert(
            "timeRequired".into(),
            json!(format!("PT{}M", article.reading_time_rounded)),
        );
    }
    if !article.citations.is_empty() {
        let citations: Vec<Value> = article
            .citations
            .iter()
            .map(|c| {
                let mut work = json!({"@type": "CreativeWork", "headline": c.headline});
                if let Some(url) = &c.url {
                    work["url"] = json!(url);
                }
                work
            })
            .collect();
        main.insert("citation".into(), Value::Array(citations));
    }
    if !article.products.is_empty() {
        let about: Vec<Value> = article
            .products
            .iter()
            .map(|p| {
                let mut product = json!({"@type": "Product"});
                if let Some(name) = &p.name {
                    product["name"] = json!(name);
                }
                if let Some(brand) = &p.brand {
                    product["brand"] = json!({"@type": "Brand", "name": brand});
                }
                product
            })
            .collect();
        main.insert("about".into(), Value::Array(about));
    }
    insert_some(&mut main, "review", reviews(article, &article.rel_path));

    let mut graph = vec![Value::Object(main)];
    if !article.breadcrumbs.is_empty() {
        let items: Vec<Value> = article
            .breadcrumbs
            .iter()
            .enumerate()
            .map(|(i, crumb)| {
                json!({
                    "@type": "ListItem",
                    "position": i + 1,
                    "name": crumb.name,
                    "item": site.absolute_url(&crumb.url),
                })
            })
            .collect();
        graph.push(json!({"@type": "BreadcrumbList", "itemListElement": items}));
    }
    if let Some(faq) = &article.faq {
        let questions: Vec<Value> = faq
            .faqs
            .iter()
            .map(|item| {
                json!({
                    "@type": "Question",
                    "name": item.q,
                    "acceptedAnswer": {"@type": "Answer", "text": item.a.html},
                })
            })
            .collect();
        graph.push(json!({"@type": "FAQPage", "mainEntity": questions}));
    }
    if let Some(howto) = &article.howto {
        graph.push(json!({"@type": "HowTo", "name": article.name, "step": howto}));
    }

    json!({"@context": "https://schema.org", "@graph": graph})
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::{Author, Crumb, Product, Review};
    use crate::article::faq::process_faq;
    use crate::config::PublisherConfig;
    use crate::markup::MultiFormat;
    use crate::test_helpers::{bare_site, dated_article};

    fn main_entity(schema: &Value) -> &Value {
        &schema["@graph"][0]
    }

    #[test]
    fn post_with_authors_and_publisher() {
        let mut site = bare_site();
        site.config.publisher = Some(PublisherConfig {
            name: "Acme".into(),
            url: Some("https://acme.example".into()),
            logo: Some("/logo.png".into()),
        });
        let mut a = dated_article("posts/a.md", "/a/", 1);
        a.type_name = "post".into();
        a.headline = "Hello".into();
        a.authors = vec![Author {
            key: "jane".into(),
            name: "Jane".into(),
            url: Some("/about/".into()),
            email: None,
            image: None,
        }];
        a.taxonomies.insert("tags".into(), vec!["rust".into(), "cli".into()]);
        a.words = 400;
        a.reading_time_rounded = 2;

        let schema = build_schema(&a, &site);
        let main = main_entity(&schema);
        assert_eq!(schema["@context"], "https://schema.org");
        assert_eq!(main["@type"], "BlogPosting");
        assert_eq!(main["url"], "http://localhost:8080/a/");
        assert_eq!(main["author"][0]["url"], "http://localhost:8080/about/");
        assert_eq!(main["publisher"]["logo"]["url"], "http://localhost:8080/logo.png");
        assert_eq!(main["keywords"], "rust, cli");
        assert_eq!(main["timeRequired"], "PT2M");
    }

    #[test]
    fn abstract_only_when_authored() {
        let site = bare_site();
        let mut a = dated_article("a.md", "/a/", 1);
        a.abstract_text = Some(MultiFormat::from_markdown("Written by hand."));
        assert_eq!(main_entity(&build_schema(&a, &site))["abstract"], "Written by hand.");

        a.abstract_synthesized = true;
        assert!(main_entity(&build_schema(&a, &site)).get("abstract").is_none());
    }

    #[test]
    fn breadcrumbs_and_faq_join_the_graph() {
        let site = bare_site();
        let mut a = dated_article("a.md", "/a/", 1);
        a.breadcrumbs = vec![
            Crumb {
                name: "Home".into(),
                url: "/".into(),
            },
            Crumb {
                name: "A".into(),
                url: "/a/".into(),
            },
        ];
        a.faq = process_faq(Some(&json!([{"q": "Why?", "a": "So."}])), "a.md");

        let schema = build_schema(&a, &site);
        let graph = schema["@graph"].as_array().unwrap();
        assert_eq!(graph.len(), 3);
        assert_eq!(graph[1]["itemListElement"][1]["position"], 2);
        assert_eq!(graph[1]["itemListElement"][0]["item"], "http://localhost:8080/");
        assert_eq!(graph[2]["mainEntity"][0]["name"], "Why?");
    }

    #[test]
    fn single_product_review() {
        let site = bare_site();
        let mut a = dated_article("a.md", "/a/", 1);
        a.products = vec![Product {
            name: Some("Widget".into()),
            brand: Some("Acme".into()),
            ..Default::default()
        }];
        a.reviews = vec![Review {
            rating: Some(4.0),
            ..Default::default()
        }];
        let main = build_schema(&a, &site)["@graph"][0].clone();
        assert_eq!(main["@type"], "Review");
        assert_eq!(main["about"][0]["brand"]["name"], "Acme");
        assert_eq!(main["review"][0]["reviewRating"]["bestRating"], 5.0);
    }

    #[test]
    fn registered_handler_sets_schema() {
        let mut bus = EventBus::new();
        Schema.register(&mut bus, &SiteConfig::default()).unwrap();
        let site = bare_site();
        let mut a = dated_article("a.md", "/a/", 1);
        bus.emit_article(Event::ArticlePrerender, &mut a, &site).unwrap();
        assert!(a.schema.is_some());
    }
}
