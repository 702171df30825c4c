use std::{
    fs,
    io::{self, Write},
    path::Path,
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::{anyhow, bail, Context, Result};
use bytes::Bytes;
use log::info;
use shupito_tools::{
    config::DescriptorFile,
    formats::{c_source, ihex},
    protocol::{
        descriptor::FUNCTIONAL_DESCRIPTOR_TYPE,
        device::{self, BuildInfo},
        dfu::{self, DfuSuffix},
        functional_descriptor, render,
    },
    utils::decoder::Decoder,
    Descriptor,
};
use termcolor::{ColorChoice, StandardStream};

use crate::{BuildOpts, Emit, InputKind, OutputOpts, SubCommand};

pub(crate) fn run_command(cmd: SubCommand) -> Result<()> {
    match cmd {
        SubCommand::Encode { file, output } => {
            let descriptor = DescriptorFile::load(&file)?
                .to_descriptor()
                .with_context(|| format!("in {}", file.display()))?;
            emit(&descriptor, &output)?
        }
        SubCommand::Preset {
            kind,
            build,
            output,
        } => emit(&device::by_kind(kind, &build_info(build)?), &output)?,
        SubCommand::Decode {
            file,
            format,
            input,
            functional,
            dump,
        } => run_decode(&file, format, input, functional, dump)?,
        SubCommand::Dfu {
            input,
            output,
            vid,
            pid,
            bcd_device,
        } => {
            let suffix = DfuSuffix {
                bcd_device,
                product_id: pid,
                vendor_id: vid,
            };
            run_dfu(&input, &output, suffix)?
        }
        SubCommand::Schema => {
            let schema = schemars::schema_for!(DescriptorFile);
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    };

    Ok(())
}

fn build_info(opts: BuildOpts) -> Result<BuildInfo> {
    let timestamp = match opts.timestamp {
        Some(timestamp) => timestamp,
        None => {
            let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
            u32::try_from(now).context("current time doesn't fit the build timestamp")?
        }
    };

    Ok(BuildInfo {
        timestamp,
        utc_offset_minutes: opts.utc_offset,
        revision: opts.revision.unwrap_or_default(),
    })
}

fn emit(descriptor: &Descriptor, opts: &OutputOpts) -> Result<()> {
    let data = match opts.emit {
        Emit::Json => {
            if opts.functional {
                bail!("--functional can't be combined with --emit json");
            }
            let json = DescriptorFile::from(descriptor).to_json()?;
            format!("{json}\n").into_bytes()
        }
        Emit::C => render::render(table(descriptor, opts.functional)?).into_bytes(),
        Emit::Array => {
            render::render_array(&opts.name, table(descriptor, opts.functional)?).into_bytes()
        }
        Emit::Bin => table(descriptor, opts.functional)?.to_vec(),
        Emit::Hex => format!("{}\n", hex::encode(table(descriptor, opts.functional)?)).into_bytes(),
    };
    write_output(opts.output.as_deref(), &data)
}

/// The framed descriptor, optionally behind its functional descriptor header
fn table(descriptor: &Descriptor, functional: bool) -> Result<Bytes> {
    let mut table = descriptor.to_framed_bytes()?;
    if functional {
        table = functional_descriptor(&table)?;
    }
    log::debug!("{} leaves, {} bytes", descriptor.root.leaf_count(), table.len());
    Ok(table)
}

fn write_output(path: Option<&Path>, data: &[u8]) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, data).with_context(|| format!("couldn't write {}", path.display()))?;
            info!("wrote {} bytes to {}", data.len(), path.display());
        }
        None => io::stdout().write_all(data)?,
    }
    Ok(())
}

fn run_decode(
    file: &Path,
    format: shupito_tools::LeafFormat,
    input: InputKind,
    functional: bool,
    dump: bool,
) -> Result<()> {
    let mut table = match input {
        InputKind::C => {
            let text = fs::read_to_string(file)
                .with_context(|| format!("couldn't read {}", file.display()))?;
            c_source::parse(&text)?
        }
        InputKind::Bin => Bytes::from(
            fs::read(file).with_context(|| format!("couldn't read {}", file.display()))?,
        ),
    };

    if functional {
        table = strip_functional_header(table)?;
    }

    if dump {
        use hexplay::HexViewBuilder;
        let view = HexViewBuilder::new(table.as_ref()).row_width(16).finish();
        view.print()?;
    }

    let mut decoder = Decoder {
        format,
        w: Box::new(StandardStream::stdout(ColorChoice::Auto)),
    };
    if !decoder.feed(table) {
        bail!("{} doesn't hold a valid descriptor", file.display());
    }
    Ok(())
}

fn strip_functional_header(table: Bytes) -> Result<Bytes> {
    match *table.as_ref() {
        [len, FUNCTIONAL_DESCRIPTOR_TYPE, ..] if len as usize == table.len() => {
            Ok(table.slice(2..))
        }
        [len, FUNCTIONAL_DESCRIPTOR_TYPE, ..] => Err(anyhow!(
            "functional descriptor claims {} bytes, the table has {}",
            len,
            table.len()
        )),
        _ => bail!("missing functional descriptor header"),
    }
}

fn run_dfu(input: &Path, output: &Path, suffix: DfuSuffix) -> Result<()> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("couldn't read {}", input.display()))?;
    let image = ihex::load(&text).with_context(|| format!("in {}", input.display()))?;
    if image.is_empty() {
        bail!("{} holds no data", input.display());
    }

    let blocks = image.blocks();
    let file = suffix.append(dfu::build_image(&blocks));
    fs::write(output, &file).with_context(|| format!("couldn't write {}", output.display()))?;

    info!(
        "wrote {} bytes in {} blocks to {}",
        file.len(),
        blocks.len(),
        output.display()
    );
    Ok(())
}
