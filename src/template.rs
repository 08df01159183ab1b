//! Body templates
//!
//! [`FileTemplates`] substitutes `{{ name }}` and `{{ a.b }}` placeholders
//! in files read from a template directory, with values taken from any
//! [`Serialize`] data. Substituted values are HTML escaped.

use std::{
    env,
    error::Error as StdError,
    fmt::{self, Display, Formatter},
    fs, io,
    path::{Path, PathBuf},
};

use serde::Serialize;
use serde_json::Value;

/// Environment variable holding the template directory
pub const TEMPLATE_DIR_ENV: &str = "MAILER_TEMPLATE_DIR";

/// Renders a template file into a message body.
pub trait TemplateEngine {
    fn render<T: Serialize + ?Sized>(&self, path: &str, data: &T) -> Result<String, TemplateError>;
}

/// Template rendering error
#[derive(Debug)]
pub enum TemplateError {
    /// The template file could not be read
    Io { path: PathBuf, source: io::Error },
    /// The data could not be serialized
    Data(serde_json::Error),
    /// Unclosed placeholder
    Syntax { path: PathBuf, position: usize },
    /// A placeholder has no value in the data
    MissingValue { path: PathBuf, key: String },
}

impl Display for TemplateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::Io { path, source } => {
                write!(f, "cannot read template {}: {source}", path.display())
            }
            TemplateError::Data(e) => write!(f, "cannot serialize template data: {e}"),
            TemplateError::Syntax { path, position } => write!(
                f,
                "unclosed placeholder at byte {position} of template {}",
                path.display()
            ),
            TemplateError::MissingValue { path, key } => {
                write!(f, "no value for {key:?} in template {}", path.display())
            }
        }
    }
}

impl StdError for TemplateError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            TemplateError::Io { source, .. } => Some(source),
            TemplateError::Data(e) => Some(e),
            _ => None,
        }
    }
}

/// Templates stored as files below a directory
#[derive(Debug, Clone)]
pub struct FileTemplates {
    dir: PathBuf,
}

impl FileTemplates {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileTemplates { dir: dir.into() }
    }

    /// Uses the directory named by `MAILER_TEMPLATE_DIR`, or the current
    /// directory when it is unset.
    pub fn from_env() -> Self {
        Self::new(env::var_os(TEMPLATE_DIR_ENV).unwrap_or_default())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl TemplateEngine for FileTemplates {
    fn render<T: Serialize + ?Sized>(&self, path: &str, data: &T) -> Result<String, TemplateError> {
        let path = self.dir.join(path);
        let source = fs::read_to_string(&path).map_err(|source| TemplateError::Io {
            path: path.clone(),
            source,
        })?;
        let data = serde_json::to_value(data).map_err(TemplateError::Data)?;

        render_str(&source, &data).map_err(|e| match e {
            RenderError::Unclosed(position) => TemplateError::Syntax { path, position },
            RenderError::Missing(key) => TemplateError::MissingValue { path, key },
        })
    }
}

enum RenderError {
    Unclosed(usize),
    Missing(String),
}

fn render_str(source: &str, data: &Value) -> Result<String, RenderError> {
    let mut out = String::with_capacity(source.len());
    let mut remaining = source;

    while let Some(start) = remaining.find("{{") {
        out.push_str(&remaining[..start]);
        let after_start = &remaining[start + 2..];
        let end = after_start
            .find("}}")
            .ok_or(RenderError::Unclosed(source.len() - remaining.len() + start))?;

        let key = after_start[..end].trim();
        let value = lookup(data, key).ok_or_else(|| RenderError::Missing(key.to_owned()))?;
        match value {
            Value::String(s) => html_escape(&mut out, s),
            Value::Null => {}
            other => html_escape(&mut out, &other.to_string()),
        }

        remaining = &after_start[end + 2..];
    }
    out.push_str(remaining);

    Ok(out)
}

fn lookup<'a>(data: &'a Value, key: &str) -> Option<&'a Value> {
    if key == "." {
        return Some(data);
    }
    key.split('.').try_fold(data, |value, segment| match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn html_escape(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use serde_json::json;

    use super::*;

    #[test]
    fn substitutes_nested_values() {
        let data = json!({"user": {"name": "Ann"}, "count": 3, "items": ["a", "b"]});
        assert_eq!(
            render_str("Hi {{ user.name }}, {{count}} new, first {{ items.0 }}", &data).ok(),
            Some("Hi Ann, 3 new, first a".to_owned())
        );
    }

    #[test]
    fn escapes_html() {
        let data = json!({"name": "<b>\"Tom\" & 'Jerry'</b>"});
        assert_eq!(
            render_str("<p>{{ name }}</p>", &data).ok(),
            Some("<p>&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;</p>".to_owned())
        );
    }

    #[test]
    fn missing_value_and_unclosed() {
        let data = json!({});
        assert!(matches!(
            render_str("{{ nope }}", &data),
            Err(RenderError::Missing(key)) if key == "nope"
        ));
        assert!(matches!(
            render_str("ab {{ nope", &data),
            Err(RenderError::Unclosed(3))
        ));
    }

    #[test]
    fn renders_files_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("welcome.html"), "<h1>Welcome {{ name }}</h1>").unwrap();

        let templates = FileTemplates::new(dir.path());
        let data: HashMap<&str, &str> = [("name", "Bob")].into_iter().collect();
        assert_eq!(
            templates.render("welcome.html", &data).unwrap(),
            "<h1>Welcome Bob</h1>"
        );

        let err = templates.render("missing.html", &data).unwrap_err();
        assert!(matches!(err, TemplateError::Io { .. }));
    }
}
