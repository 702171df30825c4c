//! Descriptor decoder aiming at inspecting tables embedded in existing firmware
//! Blobs are fed with their trailing checksum
//!
//! Once a blob is decoded, its capability tree is printed to the given writer

use std::{fmt, io::Write};

use bytes::Bytes;
use shupito_protocol::{device::caps, Descriptor, Leaf, LeafFormat, Node};
use termcolor::{Color, ColorSpec, WriteColor};

/// Main decoder
pub struct Decoder {
    pub format: LeafFormat,
    pub w: Box<dyn WriteColor + Send + Sync>,
}

impl Decoder {
    /// Feed a framed descriptor, returns whether it decoded successfully
    pub fn feed(&mut self, framed: Bytes) -> bool {
        match Descriptor::from_framed_bytes(framed, self.format) {
            Ok(descriptor) => {
                let _ = self.print_descriptor(&descriptor);
                true
            }
            Err(err) => {
                let _ = self.print_error(err);
                false
            }
        }
    }

    pub fn print_descriptor(&mut self, descriptor: &Descriptor) -> std::io::Result<()> {
        self.w
            .set_color(ColorSpec::new().set_fg(Some(Color::White)).set_bold(true))?;
        writeln!(
            self.w,
            "device {} (version {}, {} leaves)",
            descriptor.device_id,
            descriptor.version,
            descriptor.root.leaf_count()
        )?;
        self.print_node(&descriptor.root, 1)?;
        self.w.reset()
    }

    fn print_node(&mut self, node: &Node, depth: usize) -> std::io::Result<()> {
        let indent = "  ".repeat(depth);
        match node {
            Node::And(children) | Node::Or(children) => {
                let (label, color) = match node {
                    Node::Or(_) => ("OR", Color::Yellow),
                    _ => ("AND", Color::Cyan),
                };
                self.w.set_color(ColorSpec::new().set_fg(Some(color)))?;
                writeln!(self.w, "{indent}{label} ({} children)", children.len())?;
                for child in children {
                    self.print_node(child, depth + 1)?;
                }
            }
            Node::Leaf(leaf) => self.print_leaf(leaf, &indent)?,
        }
        Ok(())
    }

    fn print_leaf(&mut self, leaf: &Leaf, indent: &str) -> std::io::Result<()> {
        self.w.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        write!(self.w, "{indent}{}", leaf.capability_id)?;
        if let Some(name) = caps::name(&leaf.capability_id) {
            write!(self.w, " [{name}]")?;
        }

        self.w
            .set_color(ColorSpec::new().set_fg(Some(Color::White)).set_dimmed(true))?;
        write!(
            self.w,
            " pipes {}..{}",
            leaf.first_pipe,
            leaf.first_pipe as usize + leaf.pipe_count as usize
        )?;
        if self.format.has_flags() {
            write!(self.w, " flags 0x{:02x}", leaf.flags)?;
        }
        if !leaf.payload.is_empty() {
            write!(self.w, " payload {}", hex::encode(&leaf.payload))?;
        }
        writeln!(self.w)
    }

    fn print_error<T: fmt::Display>(&mut self, err: T) -> std::io::Result<()> {
        self.w.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
        writeln!(self.w, "{}", err)?;
        self.w.reset()
    }
}
