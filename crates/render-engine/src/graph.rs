//! Typed filter graph, serialized to `-filter_complex` syntax at the boundary.

use std::fmt;
use std::path::PathBuf;

use crate::expr::Expr;

/// A labelled stream between nodes, or an input stream specifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pad(String);

impl Pad {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Video stream of input file `index`.
    pub fn input_video(index: usize) -> Self {
        Self(format!("{index}:v"))
    }

    /// Audio stream of input file `index`.
    pub fn input_audio(index: usize) -> Self {
        Self(format!("{index}:a"))
    }

    pub fn label(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Pad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0)
    }
}

/// One encoder input file.
#[derive(Debug, Clone, PartialEq)]
pub enum InputSpec {
    /// A still looped into a video stream of `duration` seconds.
    Still {
        path: PathBuf,
        fps: u32,
        duration: f64,
    },
    Audio {
        path: PathBuf,
    },
}

impl InputSpec {
    /// Command-line arguments declaring this input.
    pub fn args(&self) -> Vec<String> {
        match self {
            InputSpec::Still {
                path,
                fps,
                duration,
            } => vec![
                "-loop".to_string(),
                "1".to_string(),
                "-framerate".to_string(),
                fps.to_string(),
                "-t".to_string(),
                format_secs(*duration),
                "-i".to_string(),
                path.to_string_lossy().into_owned(),
            ],
            InputSpec::Audio { path } => {
                vec!["-i".to_string(), path.to_string_lossy().into_owned()]
            }
        }
    }
}

/// A filter option value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// Emitted verbatim.
    Plain(String),
    /// A time-valued expression, quoted.
    Expr(Expr),
    /// A literal string option, escaped for the graph and option parsers.
    Literal(String),
    /// drawtext `text`, additionally escaped against text expansion.
    Text(String),
}

impl ArgValue {
    fn write(&self, out: &mut String) {
        match self {
            ArgValue::Plain(v) => out.push_str(v),
            ArgValue::Expr(e) => {
                out.push('\'');
                out.push_str(&e.to_engine());
                out.push('\'');
            }
            ArgValue::Literal(v) => out.push_str(&escape_option(v)),
            ArgValue::Text(t) => out.push_str(&escape_drawtext(t)),
        }
    }
}

/// One filter with its options, e.g. `scale=1920:1080`.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    name: String,
    args: Vec<(Option<String>, ArgValue)>,
}

impl Filter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: vec![],
        }
    }

    /// Positional option.
    pub fn pos(mut self, value: impl fmt::Display) -> Self {
        self.args.push((None, ArgValue::Plain(value.to_string())));
        self
    }

    /// `key=value` option.
    pub fn opt(mut self, key: &str, value: impl fmt::Display) -> Self {
        self.args
            .push((Some(key.to_string()), ArgValue::Plain(value.to_string())));
        self
    }

    /// `key='expr'` option.
    pub fn expr(mut self, key: &str, expr: Expr) -> Self {
        self.args.push((Some(key.to_string()), ArgValue::Expr(expr)));
        self
    }

    /// Literal string option such as a font name.
    pub fn literal(mut self, key: &str, value: &str) -> Self {
        self.args
            .push((Some(key.to_string()), ArgValue::Literal(value.to_string())));
        self
    }

    /// drawtext text option, rendered verbatim.
    pub fn text(mut self, key: &str, text: &str) -> Self {
        self.args
            .push((Some(key.to_string()), ArgValue::Text(text.to_string())));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value of the named option, if present.
    pub fn arg(&self, key: &str) -> Option<&ArgValue> {
        self.args
            .iter()
            .find(|(k, _)| k.as_deref() == Some(key))
            .map(|(_, v)| v)
    }

    fn write(&self, out: &mut String) {
        out.push_str(&self.name);
        for (i, (key, value)) in self.args.iter().enumerate() {
            out.push(if i == 0 { '=' } else { ':' });
            if let Some(key) = key {
                out.push_str(key);
                out.push('=');
            }
            value.write(out);
        }
    }
}

/// Role of a node in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Generated base canvas.
    Source,
    /// Effect chain for one video clip.
    ClipChain,
    /// Time-windowed overlay of a clip onto the composite.
    Overlay,
    /// Text drawn onto the composite.
    TextDraw,
    /// Effect chain for one audio clip.
    AudioChain,
    /// Final audio sum and loudness pass.
    AudioMix,
}

/// A linear filter chain from input pads to one output pad.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub inputs: Vec<Pad>,
    pub filters: Vec<Filter>,
    pub output: Pad,
}

impl Node {
    pub fn new(kind: NodeKind, inputs: Vec<Pad>, filters: Vec<Filter>, output: Pad) -> Self {
        Self {
            kind,
            inputs,
            filters,
            output,
        }
    }

    fn write(&self, out: &mut String) {
        for pad in &self.inputs {
            out.push_str(&pad.to_string());
        }
        for (i, filter) in self.filters.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            filter.write(out);
        }
        out.push_str(&self.output.to_string());
    }
}

/// Encoder inputs plus the DAG of nodes consuming them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterGraph {
    pub inputs: Vec<InputSpec>,
    pub nodes: Vec<Node>,
}

impl FilterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an input, returning its index.
    pub fn add_input(&mut self, input: InputSpec) -> usize {
        self.inputs.push(input);
        self.inputs.len() - 1
    }

    pub fn push(&mut self, node: Node) -> Pad {
        let output = node.output.clone();
        self.nodes.push(node);
        output
    }

    pub fn nodes_of(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.kind == kind)
    }

    /// Serialize to `-filter_complex` syntax.
    pub fn to_filter_complex(&self) -> String {
        let mut out = String::new();
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                out.push(';');
            }
            node.write(&mut out);
        }
        out
    }
}

/// Characters the drawtext text expander treats specially.
const EXPANSION_SPECIAL: &str = "\\%";
/// Characters special to a `key=value` option value.
const OPTION_SPECIAL: &str = "\\':";
/// Characters special to the filter graph parser.
const GRAPH_SPECIAL: &str = "\\'[],;";

/// Backslash-escape every char in `special` and all whitespace.
fn backslash_escape(text: &str, special: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        if special.contains(c) || c.is_whitespace() {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape a literal option value so both the graph parser and the option
/// parser hand it to the filter unchanged.
pub fn escape_option(value: &str) -> String {
    backslash_escape(&backslash_escape(value, OPTION_SPECIAL), GRAPH_SPECIAL)
}

/// Escape drawtext text so it is drawn exactly as given.
///
/// The text is unescaped three times: by the graph parser, by the option
/// parser, and by drawtext's own `%{...}` expansion. Newlines collapse to
/// spaces.
pub fn escape_drawtext(text: &str) -> String {
    let flat: String = text
        .chars()
        .filter(|&c| c != '\r')
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect();
    escape_option(&backslash_escape(&flat, EXPANSION_SPECIAL))
}

/// Seconds with millisecond precision and no trailing zeros.
pub fn format_secs(secs: f64) -> String {
    let rounded = (secs * 1000.0).round() / 1000.0;
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{rounded}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_serialization() {
        let f = Filter::new("scale")
            .pos(1920)
            .pos(1080)
            .opt("force_original_aspect_ratio", "decrease");
        let mut out = String::new();
        f.write(&mut out);
        assert_eq!(out, "scale=1920:1080:force_original_aspect_ratio=decrease");

        let mut bare = String::new();
        Filter::new("setsar").write(&mut bare);
        assert_eq!(bare, "setsar");
    }

    #[test]
    fn test_graph_serialization() {
        let mut graph = FilterGraph::new();
        let base = graph.push(Node::new(
            NodeKind::Source,
            vec![],
            vec![Filter::new("color").opt("c", "black").opt("s", "64x36")],
            Pad::new("base"),
        ));
        graph.push(Node::new(
            NodeKind::Overlay,
            vec![base, Pad::new("v0")],
            vec![Filter::new("overlay").expr("enable", Expr::window(0.0, 2.0))],
            Pad::new("c0"),
        ));
        assert_eq!(
            graph.to_filter_complex(),
            "color=c=black:s=64x36[base];[base][v0]overlay=enable='(gte(t,0)*lt(t,2))'[c0]"
        );
        assert_eq!(graph.nodes_of(NodeKind::Overlay).count(), 1);
    }

    /// Undo one level of ffmpeg token parsing: `\x` yields `x`, quoted runs
    /// are literal, and unescaped edge whitespace is dropped.
    fn unescape_token(token: &str) -> String {
        let mut out = String::new();
        let mut keep = 0;
        let mut chars = token.trim_start().chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    if let Some(next) = chars.next() {
                        out.push(next);
                        keep = out.len();
                    }
                }
                '\'' => {
                    for q in chars.by_ref() {
                        if q == '\'' {
                            break;
                        }
                        out.push(q);
                    }
                    keep = out.len();
                }
                other => out.push(other),
            }
        }
        let trimmed = out[keep..].trim_end().len();
        out.truncate(keep + trimmed);
        out
    }

    /// What drawtext draws after its own `\x` unescaping (no `%` allowed).
    fn expand(text: &str) -> Option<String> {
        let mut out = String::new();
        let mut chars = text.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => out.push(chars.next()?),
                '%' => return None,
                other => out.push(other),
            }
        }
        Some(out)
    }

    fn drawn(text: &str) -> Option<String> {
        expand(&unescape_token(&unescape_token(&escape_drawtext(text))))
    }

    #[test]
    fn test_escape_drawtext_survives_every_parser() {
        for text in [
            "It's 5:00",
            "100% sure",
            r"a\b",
            "[chapter one]; a, b",
            " padded ",
            "'quoted'",
            "%{localtime}",
        ] {
            assert_eq!(drawn(text).as_deref(), Some(text), "{text:?}");
        }
        assert_eq!(drawn("two\r\nlines").as_deref(), Some("two lines"));
    }

    #[test]
    fn test_text_option_does_not_swallow_following_options() {
        let f = Filter::new("drawtext")
            .literal("font", "DejaVu Sans:style=Bold")
            .text("text", "It's 5:00")
            .opt("fontsize", 40);
        let mut out = String::new();
        f.write(&mut out);
        let args = out.strip_prefix("drawtext=").unwrap();
        assert!(args.ends_with(":fontsize=40"));
        assert_eq!(
            unescape_token(&unescape_token(&escape_option("DejaVu Sans:style=Bold"))),
            "DejaVu Sans:style=Bold"
        );
    }

    #[test]
    fn test_input_args() {
        let still = InputSpec::Still {
            path: PathBuf::from("/tmp/a.png"),
            fps: 24,
            duration: 5.0,
        };
        assert_eq!(
            still.args(),
            vec!["-loop", "1", "-framerate", "24", "-t", "5", "-i", "/tmp/a.png"]
        );
        assert_eq!(format_secs(2.50004), "2.5");
    }
}
