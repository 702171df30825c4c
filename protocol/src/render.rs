//! Renders byte blobs as C source

use core::fmt::Write;

/// Number of bytes per rendered row
pub const ROW_WIDTH: usize = 16;

/// Renders `data` as comma terminated hex literals, 16 per line
pub fn render<T: AsRef<[u8]>>(data: T) -> String {
    let mut out = String::new();
    for row in data.as_ref().chunks(ROW_WIDTH) {
        out.push_str(&render_row(row));
        out.push('\n');
    }
    out
}

/// Renders `data` as a complete program memory array declaration
pub fn render_array<T: AsRef<[u8]>>(name: &str, data: T) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "static uint8_t const {name}[] PROGMEM = {{");
    for row in data.as_ref().chunks(ROW_WIDTH) {
        let _ = writeln!(out, "    {}", render_row(row));
    }
    out.push_str("};\n");
    out
}

fn render_row(row: &[u8]) -> String {
    row.iter()
        .map(|b| format!("0x{b:02x},"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn render_test() {
        assert_eq!(render([0x00u8, 0x01, 0x01]), "0x00, 0x01, 0x01,\n");
        assert_eq!(render([0u8; 0]), "");

        let data: Vec<u8> = (0..17).collect();
        let rendered = render(&data);
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("0x00, 0x01,"));
        assert!(lines[0].ends_with("0x0e, 0x0f,"));
        assert_eq!(lines[1], "0x10,");
    }

    #[test]
    fn render_array_test() {
        let rendered = render_array("yb_desc", [0xabu8, 0xcd]);
        assert_eq!(
            rendered,
            "static uint8_t const yb_desc[] PROGMEM = {\n    0xab, 0xcd,\n};\n"
        );
    }
}
