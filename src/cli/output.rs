//! Rendering of reported zombies

use std::io::Write;

use anyhow::{Context, Result};
use kube::ResourceExt;
use kube::core::DynamicObject;

use flux_zombies::config::OutputFormat;
use flux_zombies::models;

/// Render a single zombie in the requested format
pub fn render(obj: &DynamicObject, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Name => Ok(render_name(obj)),
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(obj).context("Failed to serialize zombie to YAML")?;
            Ok(format!("---\n{}", yaml.trim_end()))
        }
        OutputFormat::Json => {
            serde_json::to_string_pretty(obj).context("Failed to serialize zombie to JSON")
        }
    }
}

/// `Kind/namespace/name`, or `Kind/name` for cluster-scoped objects
fn render_name(obj: &DynamicObject) -> String {
    let kind = match models::kind(obj) {
        "" => "Unknown",
        kind => kind,
    };
    match obj.namespace() {
        Some(namespace) => format!("{}/{}/{}", kind, namespace, obj.name_any()),
        None => format!("{}/{}", kind, obj.name_any()),
    }
}

/// Writes zombies as they arrive, or holds them until `finish` when buffering
pub struct ZombiePrinter<W: Write> {
    out: W,
    format: OutputFormat,
    buffered: Option<Vec<String>>,
    count: usize,
}

impl<W: Write> ZombiePrinter<W> {
    pub fn new(out: W, format: OutputFormat, no_stream: bool) -> Self {
        Self {
            out,
            format,
            buffered: no_stream.then(Vec::new),
            count: 0,
        }
    }

    /// Record one zombie. It counts even if it can not be rendered.
    pub fn print(&mut self, obj: &DynamicObject) -> Result<()> {
        self.count += 1;
        let text = render(obj, self.format)?;
        match &mut self.buffered {
            Some(buffer) => buffer.push(text),
            None => writeln!(self.out, "{}", text).context("Failed to write zombie")?,
        }
        Ok(())
    }

    /// Flush any buffered zombies and return how many were recorded
    pub fn finish(mut self) -> Result<usize> {
        for text in self.buffered.take().unwrap_or_default() {
            writeln!(self.out, "{}", text).context("Failed to write zombie")?;
        }
        self.out.flush().context("Failed to flush output")?;
        Ok(self.count)
    }
}
