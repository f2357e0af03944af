//! Call stack capture and source context rendering
//!
//! The resolver walks the active stack, drops frames that belong to the
//! standard library, to dependencies or to this crate (frames of this
//! crate's own unit tests are kept), and renders selected frames together
//! with a window of the surrounding source lines.
//!
//! Reading source is best effort. The first file that cannot be opened
//! disables source context for the lifetime of the resolver: deployed
//! binaries rarely ship their sources and retrying on every record would
//! only produce noise.

use super::theme::RESET;
use crate::args;
use parking_lot::RwLock;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Width a tab expands to in source context
pub const TAB_WIDTH: usize = 4;

const SEPARATOR: &str = " ";
const INDENT: &str = "  ";

/// One activation of the call stack, copied out at capture time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub file: PathBuf,
    pub line: u32,
    pub function: String,
}

impl Frame {
    pub fn new(file: impl Into<PathBuf>, line: u32, function: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            function: function.into(),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}() {}:{}", self.function, self.file.display(), self.line)
    }
}

/// A line of source text with its 1-based line number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub line: u32,
    pub text: String,
}

/// Predicate excluding a frame from display
pub type IgnoreFilter = Arc<dyn Fn(&Frame) -> bool + Send + Sync>;

pub struct CallstackResolver {
    disabled: AtomicBool,
    filters: RwLock<Vec<IgnoreFilter>>,
    cwd: Option<PathBuf>,
    home: Option<PathBuf>,
}

impl CallstackResolver {
    /// Resolver with the default ignore filter installed
    pub fn new() -> Self {
        let resolver = Self::without_filters();
        resolver.add_ignore_filter(default_ignore);
        resolver
    }

    /// Resolver that keeps every frame until filters are added
    pub fn without_filters() -> Self {
        Self {
            disabled: AtomicBool::new(false),
            filters: RwLock::new(Vec::new()),
            cwd: std::env::current_dir().ok(),
            home: std::env::var_os("HOME")
                .or_else(|| std::env::var_os("USERPROFILE"))
                .map(PathBuf::from),
        }
    }

    /// Add a predicate; a frame matching any predicate is not displayed
    pub fn add_ignore_filter<F>(&self, filter: F)
    where
        F: Fn(&Frame) -> bool + Send + Sync + 'static,
    {
        self.filters.write().push(Arc::new(filter));
    }

    pub fn is_ignored(&self, frame: &Frame) -> bool {
        self.filters.read().iter().any(|filter| filter(frame))
    }

    /// Capture the current call stack.
    ///
    /// Ignored frames are removed first, then `skip` frames are dropped and
    /// at most `count` are kept (`count < 0` keeps all remaining frames).
    pub fn capture(&self, skip: usize, count: i32) -> Vec<Frame> {
        self.select(walk_stack(), skip, count)
    }

    /// Filtering and windowing applied by [`CallstackResolver::capture`]
    pub fn select(&self, frames: Vec<Frame>, skip: usize, count: i32) -> Vec<Frame> {
        let kept = frames.into_iter().filter(|frame| !self.is_ignored(frame));
        let kept = kept.skip(skip);
        if count < 0 {
            kept.collect()
        } else {
            kept.take(count as usize).collect()
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Relaxed)
    }

    /// Stop reading source files from now on
    pub fn disable(&self) {
        self.disabled.store(true, Ordering::Relaxed);
    }

    /// Re-enable source reading
    pub fn reset(&self) {
        self.disabled.store(false, Ordering::Relaxed);
    }

    /// Source lines within `context_lines` of the frame's line.
    ///
    /// Returns nothing when `context_lines` is negative, when source reading
    /// is disabled, or when the file cannot be opened (which disables
    /// reading for every later call).
    pub fn source_context(&self, frame: &Frame, context_lines: i32) -> Vec<SourceLine> {
        if frame.line == 0 || context_lines < 0 || self.is_disabled() {
            return Vec::new();
        }

        let file = match File::open(&frame.file) {
            Ok(file) => file,
            Err(err) => {
                self.disable();
                crate::core::internal::internal_log().error(
                    "Disabling callstack context. Could not read source file.",
                    &args!["file", frame.file.display().to_string(), "err", err.to_string()],
                );
                return Vec::new();
            }
        };

        let start = frame.line.saturating_sub(context_lines as u32).max(1);
        let end = frame.line.saturating_add(context_lines as u32);

        let mut result = Vec::new();
        let mut reader = BufReader::new(file);
        let mut raw = Vec::new();
        let mut lineno: u32 = 1;
        while lineno <= end {
            raw.clear();
            match reader.read_until(b'\n', &mut raw) {
                Ok(0) => break,
                Ok(_) => {}
                Err(err) => {
                    crate::core::internal::internal_log().warn(
                        "Error while reading source file",
                        &args!["file", frame.file.display().to_string(), "err", err.to_string()],
                    );
                    break;
                }
            }
            if lineno >= start {
                let text = String::from_utf8_lossy(&raw);
                let text = text.trim_end_matches(['\n', '\r']);
                result.push(SourceLine {
                    line: lineno,
                    text: expand_tabs(text, TAB_WIDTH),
                });
            }
            lineno += 1;
        }
        result
    }

    /// Path shown to the developer: relative to the working directory, or
    /// with the home directory abbreviated to `~`
    pub fn display_path(&self, file: &Path) -> String {
        if let Some(rel) = self.cwd.as_deref().and_then(|cwd| file.strip_prefix(cwd).ok()) {
            return rel.display().to_string();
        }
        if let Some(rel) = self.home.as_deref().and_then(|home| file.strip_prefix(home).ok()) {
            return format!("~{}{}", std::path::MAIN_SEPARATOR, rel.display());
        }
        file.display().to_string()
    }

    /// Render one frame: a header naming the function and location and,
    /// unless `context_lines` is negative, the surrounding source with the
    /// frame's own line highlighted.
    pub fn render(
        &self,
        frame: &Frame,
        context_lines: i32,
        color: &str,
        source_color: &str,
    ) -> String {
        let colored = !color.is_empty() || !source_color.is_empty();
        let mut out = String::new();
        out.push_str(color);
        out.push_str(SEPARATOR);
        out.push_str(INDENT);

        if self.is_disabled() {
            out.push_str(&self.display_path(&frame.file));
            out.push(':');
            out.push_str(&frame.line.to_string());
            if colored {
                out.push_str(RESET);
            }
            return out;
        }

        out.push_str("in ");
        out.push_str(&frame.function);
        out.push_str("() ");
        out.push_str(&self.display_path(&frame.file));
        out.push(':');
        out.push_str(&frame.line.to_string());

        let lines = self.source_context(frame, context_lines);
        if lines.is_empty() {
            if colored {
                out.push_str(RESET);
            }
            return out;
        }

        let lineno_width = lines
            .iter()
            .map(|li| li.line.to_string().len())
            .max()
            .unwrap_or(1);
        let skip_spaces = lines
            .iter()
            .filter_map(|li| index_of_non_space(&li.text))
            .min()
            .unwrap_or(0);
        let show_arrow = context_lines > 0;

        for li in &lines {
            out.push('\n');
            let text = &li.text[skip_spaces.min(li.text.len())..];
            let marker = if li.line == frame.line {
                out.push_str(color);
                if show_arrow { "=> " } else { "" }
            } else {
                out.push_str(source_color);
                if show_arrow { "   " } else { "" }
            };
            out.push_str(SEPARATOR);
            out.push_str(INDENT);
            out.push_str(INDENT);
            out.push_str(marker);
            out.push_str(&format!("{:>width$}:  {}", li.line, text, width = lineno_width));
        }
        if colored {
            out.push_str(RESET);
        }
        out
    }

    /// Render several frames, one block per frame, each ending in a newline
    pub fn render_stack(
        &self,
        frames: &[Frame],
        context_lines: i32,
        color: &str,
        source_color: &str,
    ) -> String {
        let mut out = String::new();
        for frame in frames {
            let block = self.render(frame, context_lines, color, source_color);
            if !block.is_empty() {
                out.push_str(&block);
                out.push('\n');
            }
        }
        out
    }
}

impl Default for CallstackResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolver shared by every formatter of the process
pub fn resolver() -> Arc<CallstackResolver> {
    static RESOLVER: OnceLock<Arc<CallstackResolver>> = OnceLock::new();
    Arc::clone(RESOLVER.get_or_init(|| Arc::new(CallstackResolver::new())))
}

/// Excludes frames without source, frames of the standard library and
/// dependencies, and this crate's own frames except its unit tests
pub fn default_ignore(frame: &Frame) -> bool {
    if frame.line == 0 || frame.file.as_os_str().is_empty() {
        return true;
    }
    let file = frame.file.to_string_lossy();
    if file.starts_with("/rustc/")
        || file.contains(".cargo/registry")
        || file.contains(".rustup")
        || file.contains("library/std/src")
        || file.contains("library/core/src")
        || file.contains("library/alloc/src")
    {
        return true;
    }

    let crate_name = module_path!().split("::").next().unwrap_or_default();
    let in_crate_src = frame
        .file
        .starts_with(Path::new(env!("CARGO_MANIFEST_DIR")).join("src"));
    let in_crate_fn = frame.function.contains(&format!("{}::", crate_name));
    (in_crate_src || in_crate_fn) && !frame.function.contains("::tests::")
}

#[cfg(feature = "callstack")]
fn walk_stack() -> Vec<Frame> {
    let trace = backtrace::Backtrace::new();
    let mut frames = Vec::new();
    for frame in trace.frames() {
        for symbol in frame.symbols() {
            let (Some(file), Some(line)) = (symbol.filename(), symbol.lineno()) else {
                continue;
            };
            let function = symbol
                .name()
                .map(|name| format!("{:#}", name))
                .unwrap_or_default();
            frames.push(Frame::new(file, line, function));
        }
    }
    frames
}

#[cfg(not(feature = "callstack"))]
fn walk_stack() -> Vec<Frame> {
    Vec::new()
}

/// Replace tabs with spaces up to the next multiple of `tab_width`
pub fn expand_tabs(s: &str, tab_width: usize) -> String {
    if !s.contains('\t') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + tab_width * 2);
    let mut col = 0;
    for c in s.chars() {
        if c == '\t' {
            let pad = tab_width - col % tab_width;
            out.extend(std::iter::repeat(' ').take(pad));
            col += pad;
        } else {
            out.push(c);
            col += 1;
        }
    }
    out
}

fn index_of_non_space(s: &str) -> Option<usize> {
    s.char_indices().find(|(_, c)| *c != ' ').map(|(i, _)| i)
}
