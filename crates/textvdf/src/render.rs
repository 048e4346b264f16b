use keyvalues::{ContentTree, Value, VdfString};

/// Renders `tree` in the canonical text form hashed into `checksum_text`.
///
/// Strings are emitted as the bytes they were decoded from, so Latin‑1
/// sourced values hash the same as they did in Steam's copy.
pub fn render(tree: &ContentTree) -> Vec<u8> {
    let mut out = Vec::new();
    render_into(&mut out, tree, 0);
    out
}

/// Renders `tree` as text. Latin‑1 strings are written as their decoded
/// characters.
pub fn render_string(tree: &ContentTree) -> String {
    let mut out = String::new();
    render_text_into(&mut out, tree, 0);
    out
}

fn render_into(out: &mut Vec<u8>, tree: &ContentTree, depth: usize) {
    for (key, value) in tree {
        push_tabs(out, depth);
        push_quoted(out, &key.to_bytes());
        match value {
            Value::Dict(child) => {
                out.push(b'\n');
                push_tabs(out, depth);
                out.extend_from_slice(b"{\n");
                render_into(out, child, depth + 1);
                push_tabs(out, depth);
                out.extend_from_slice(b"}\n");
            }
            leaf => {
                out.extend_from_slice(b"\t\t");
                push_quoted(out, &leaf_bytes(leaf));
                out.push(b'\n');
            }
        }
    }
}

fn leaf_bytes(value: &Value) -> Vec<u8> {
    match value {
        Value::Str(s) => s.to_bytes(),
        // ints hash as their unsigned 32-bit reading
        Value::Int32(n) => (*n as u32).to_string().into_bytes(),
        Value::Int64(n) => n.to_string().into_bytes(),
        Value::Dict(_) => Vec::new(),
    }
}

fn push_tabs(out: &mut Vec<u8>, depth: usize) {
    out.extend(std::iter::repeat(b'\t').take(depth));
}

fn push_quoted(out: &mut Vec<u8>, bytes: &[u8]) {
    out.push(b'"');
    for &b in bytes {
        if b == b'\\' {
            out.push(b'\\');
        }
        out.push(b);
    }
    out.push(b'"');
}

fn render_text_into(out: &mut String, tree: &ContentTree, depth: usize) {
    let tabs = "\t".repeat(depth);
    for (key, value) in tree {
        match value {
            Value::Dict(child) => {
                out.push_str(&format!("{tabs}\"{}\"\n{tabs}{{\n", escape(key)));
                render_text_into(out, child, depth + 1);
                out.push_str(&format!("{tabs}}}\n"));
            }
            Value::Str(s) => {
                out.push_str(&format!("{tabs}\"{}\"\t\t\"{}\"\n", escape(key), escape(s)));
            }
            Value::Int32(n) => {
                out.push_str(&format!("{tabs}\"{}\"\t\t\"{}\"\n", escape(key), *n as u32));
            }
            Value::Int64(n) => {
                out.push_str(&format!("{tabs}\"{}\"\t\t\"{}\"\n", escape(key), n));
            }
        }
    }
}

/// Only the display form escapes quotes; the checksum input does not.
fn escape(s: &VdfString) -> String {
    s.as_str().replace('\\', "\\\\").replace('"', "\\\"")
}
