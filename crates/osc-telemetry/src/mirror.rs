use rosc::OscType;
use std::io::Write;

const ADDRESS_WIDTH: usize = 20;

/// Human-readable echo of every outgoing message.
///
/// Purely observational: a broken output stream disables the mirror but never
/// affects encoding or transmission.
pub struct VerboseMirror {
    out: Box<dyn Write>,
    broken: bool,
}

impl VerboseMirror {
    pub fn new(out: impl Write + 'static) -> Self {
        Self {
            out: Box::new(out),
            broken: false,
        }
    }

    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Echo one address with a scalar (one value) or vector (several values).
    pub fn mirror(&mut self, address: &str, values: &[OscType]) {
        if self.broken {
            return;
        }
        let line = render_line(address, values);
        if let Err(e) = writeln!(self.out, "{line}") {
            tracing::warn!(error = %e, "verbose output failed; disabling mirror");
            self.broken = true;
        }
    }
}

impl std::fmt::Debug for VerboseMirror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerboseMirror")
            .field("broken", &self.broken)
            .finish()
    }
}

/// `<address>:` padded to a fixed column, then each value right-aligned.
pub fn render_line(address: &str, values: &[OscType]) -> String {
    let mut line = format!("{:<width$}", format!("{address}:"), width = ADDRESS_WIDTH);
    if values.len() > 1 {
        line.push_str(" (");
        let parts: Vec<String> = values.iter().map(render_value).collect();
        line.push_str(&parts.join(","));
        line.push(')');
    } else if let Some(v) = values.first() {
        line.push(' ');
        line.push_str(&render_value(v));
    }
    line
}

fn render_value(v: &OscType) -> String {
    match v {
        OscType::Bool(b) => format!("{b:>6}"),
        OscType::Int(i) => format!("{i:>5}"),
        OscType::Float(f) => format!("{f:>10.4}"),
        other => format!("{other:?}"),
    }
}
