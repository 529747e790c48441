use std::path::Path;
use std::sync::Arc;

use minijinja::{Environment, path_loader};
use minijinja::value::Value;
use serde::Serialize;

use crate::error::{Chainable, Result};
use crate::templating::{template_file_name, Engine};
use crate::tree::Node;

#[derive(Debug)]
pub struct MiniJinjaEngine {
    env: Environment<'static>,
}

impl MiniJinjaEngine {
    /// An engine loading templates from the directory `root`, with `globals`
    /// available to every template as `G`.
    pub fn new<G: Serialize>(root: &Path, globals: G) -> Self {
        let mut env = Environment::new();
        env.set_loader(path_loader(root));
        env.add_global("G", Value::from_serialize(&globals));
        env.add_filter("date", ext::date);
        env.add_filter("attrs", ext::attrs);
        MiniJinjaEngine { env }
    }

    /// An engine with inline templates only. Used by tests.
    pub fn from_templates<G, I, N, S>(templates: I, globals: G) -> Result<Self>
        where G: Serialize,
              I: IntoIterator<Item = (N, S)>,
              N: Into<String>,
              S: Into<String>,
    {
        let mut env = Environment::new();
        for (name, source) in templates {
            let name = name.into();
            env.add_template_owned(name.clone(), source.into())
                .chain_with(|| error!("invalid template", "name" => name))?;
        }

        env.add_global("G", Value::from_serialize(&globals));
        env.add_filter("date", ext::date);
        env.add_filter("attrs", ext::attrs);
        Ok(MiniJinjaEngine { env })
    }
}

impl Engine for MiniJinjaEngine {
    fn render(&self, name: &str, node: &Arc<Node>) -> Result<String> {
        let file_name = template_file_name(name);
        let template = self.env.get_template(&file_name)
            .chain_with(|| error!("failed to load template", "template" => &file_name))?;

        let string = template.render(Value::from_object(NodeObject(node.clone())))
            .chain_with(|| error!("failed to render template", "template" => &file_name))?;

        Ok(string)
    }

    fn render_str(&self, template_str: &str, node: &Arc<Node>) -> Result<String> {
        let context = Value::from_object(NodeObject(node.clone()));
        Ok(self.env.render_str(template_str, context)?)
    }
}

/// A node as seen by templates. Fields are computed on access.
#[derive(Debug)]
struct NodeObject(Arc<Node>);

#[derive(Serialize)]
struct MetadataView<'a> {
    title: &'a str,
    template: &'a str,
    date: Option<String>,
}

mod node_object {
    use std::sync::Arc;

    use minijinja::value::{Enumerator, Object, Value};

    use super::{MetadataView, NodeObject};

    const FIELDS: &[&str] = &[
        "name", "url", "source", "kind", "title", "template", "date",
        "content", "metadata", "children", "extra",
    ];

    impl Object for NodeObject {
        fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
            let node = &self.0;
            let value = match key.as_str()? {
                "name" => Value::from(node.name.as_str()),
                "url" => Value::from(node.url()?),
                "source" => Value::from(node.source.display().to_string()),
                "kind" => Value::from(node.kind_name()),
                "title" => Value::from(node.metadata()?.title.as_str()),
                "template" => Value::from(node.metadata()?.template.as_str()),
                "date" => Value::from(node.metadata()?.date?.to_rfc3339()),
                "content" => Value::from_safe_string(node.body()?.to_string()),
                "metadata" => {
                    let metadata = node.metadata()?;
                    Value::from_serialize(&MetadataView {
                        title: &metadata.title,
                        template: &metadata.template,
                        date: metadata.date.map(|d| d.to_rfc3339()),
                    })
                }
                "children" => node.children().iter()
                    .map(|child| Value::from_object(NodeObject(child.clone())))
                    .collect::<Vec<_>>()
                    .into(),
                "extra" => Value::from_serialize(node.extra()?),
                _ => return None,
            };

            Some(value)
        }

        fn enumerate(self: &Arc<Self>) -> Enumerator {
            Enumerator::Str(FIELDS)
        }
    }
}

mod ext {
    use std::collections::BTreeMap;

    use chrono::DateTime;
    use minijinja::{value::Value, Error, ErrorKind};

    use crate::markdown::parse_attributes;
    use crate::metadata::{parse_date, TIME_ZONE};

    const DEFAULT_FORMAT: &str = "%Y-%m-%d";

    /// `{{ date | date("%B %e, %Y") }}`: formats an RFC 3339 date, or one in
    /// front matter format, in the site's time zone.
    pub fn date(value: &str, fmt: Option<&str>) -> Result<String, Error> {
        let fmt = fmt.unwrap_or(DEFAULT_FORMAT);
        let datetime = DateTime::parse_from_rfc3339(value)
            .map(|d| d.with_timezone(&TIME_ZONE))
            .or_else(|_| parse_date(value))
            .map_err(|_| Error::new(
                ErrorKind::InvalidOperation,
                format!("`date` can't parse {value:?} as a date")
            ))?;

        Ok(datetime.format(fmt).to_string())
    }

    /// `{{ 'lang="rust" title="x"' | attrs }}`: parses an attribute string
    /// into a map.
    pub fn attrs(value: &str) -> Value {
        let attributes: BTreeMap<_, _> = parse_attributes(value).into_iter().collect();
        Value::from_serialize(&attributes)
    }
}
