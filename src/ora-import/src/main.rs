// This file is part of Drawpile.
// Copyright (C) 2021 Calle Laakkonen
//
// Drawpile is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// As additional permission under section 7, you are allowed to distribute
// the software through an app store, even if that store has restrictive
// terms and conditions that are incompatible with the GPL, provided that
// the source is also available under the GPL with or without this permission
// through a channel without those restrictive terms and conditions.
//
// Drawpile is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with Drawpile.  If not, see <https://www.gnu.org/licenses/>.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::Level;

use dphost::{DocumentHost, MemoryDocument, MemoryHost};
use dpora::blend::svg_name;
use dpora::{
    ArchiveExtractor, CommandExtractor, ImportOptions, ImportReport, Importer, ZipExtractor,
};

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
enum Extractor {
    #[default]
    Builtin,
    Command,
}

impl FromStr for Extractor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "builtin" => Ok(Self::Builtin),
            "command" => Ok(Self::Command),
            _ => Err(format!(
                "invalid extractor '{s}', should be 'builtin' or 'command'"
            )),
        }
    }
}

/// Import an OpenRaster file and print the resulting layer stack
#[derive(Parser, Debug)]
#[clap(version, about)]
struct Cli {
    /// Input file
    #[clap(value_parser)]
    input: PathBuf,

    /// Document resolution in pixels per inch
    #[clap(long, value_parser, default_value_t = 72.0)]
    resolution: f64,

    /// Reject files without a correct mimetype entry
    #[clap(long)]
    strict_mimetype: bool,

    /// Keep the background layer of the new document
    #[clap(long)]
    keep_background: bool,

    /// How to extract the archive (builtin or command)
    #[clap(long, value_parser, default_value = "builtin")]
    extractor: Extractor,

    /// Program used by the command extractor
    #[clap(long, value_parser, default_value = "unzip")]
    unzip_program: PathBuf,

    /// Seconds to wait for the extracted manifest
    #[clap(long, value_parser, value_name = "SECS", default_value_t = 10)]
    extraction_timeout: u64,

    /// Directory to extract into (system temp directory by default)
    #[clap(long, value_parser, value_name = "DIR")]
    scratch_dir: Option<PathBuf>,

    /// Show debug output
    #[clap(short, long)]
    verbose: bool,
}

impl Cli {
    fn options(&self) -> ImportOptions {
        ImportOptions {
            resolution: self.resolution,
            extraction_timeout: Duration::from_secs(self.extraction_timeout),
            strict_mimetype: self.strict_mimetype,
            keep_background: self.keep_background,
            scratch_parent: self.scratch_dir.clone(),
        }
    }

    fn extractor(&self) -> Box<dyn ArchiveExtractor> {
        match self.extractor {
            Extractor::Builtin => Box::new(ZipExtractor),
            Extractor::Command => Box::new(CommandExtractor::new(self.unzip_program.as_os_str())),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt::Subscriber::builder()
        .with_max_level(if cli.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    let options = cli.options();
    let extractor = cli.extractor();
    let mut host = MemoryHost::new();

    let report = Importer::new(&mut host, extractor.as_ref(), &options)
        .import(&cli.input)
        .with_context(|| format!("Couldn't import {}", cli.input.display()))?;

    let doc = host
        .document(report.document)
        .context("Imported document disappeared")?;

    print_document(doc, &host, &report);
    print!("{}", report);

    Ok(())
}

/// Print the layers of the document from top to bottom
fn print_document(doc: &MemoryDocument, host: &MemoryHost, report: &ImportReport) {
    println!(
        "{} ({}x{} @ {} ppi)",
        doc.name, doc.width, doc.height, doc.resolution
    );

    let layers = match host.layers(doc.id) {
        Ok(layers) => layers,
        Err(e) => {
            println!("  could not list layers: {}", e);
            return;
        }
    };

    for info in layers.iter().rev() {
        let layer = match doc.layer(info.id) {
            Some(l) => l,
            None => continue,
        };
        let bounds = layer.bounds();
        let visible_area = match doc.visible_area(layer.id) {
            Some(r) => format!("{}x{}+{}+{}", r.w, r.h, r.x, r.y),
            None => "outside canvas".to_string(),
        };
        let incomplete = report
            .layers
            .iter()
            .any(|l| l.layer == layer.id && !l.is_complete());

        println!(
            "  [{}] \"{}\" {}x{}+{}+{} opacity={}% {} {} (visible: {}){}",
            layer.id,
            layer.name,
            bounds.w,
            bounds.h,
            bounds.x,
            bounds.y,
            layer.opacity,
            if layer.visible { "shown" } else { "hidden" },
            svg_name(layer.blendmode),
            visible_area,
            if incomplete { " *" } else { "" },
        );
    }
}
