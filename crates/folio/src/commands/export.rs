//! `folio export` command implementation.

use std::path::PathBuf;

use clap::Args;
use folio_config::{CliSettings, Config};
use folio_export::{
    DirectorySink, DocumentShell, ExportError, ExportFormat, ExportOptions, ExportReport,
    Exporter, PlaceholderResolver, QrCodeEncoder, UploadStatus,
};

use super::open_editor;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the export command.
#[derive(Args)]
pub(crate) struct ExportArgs {
    /// Document markup file.
    file: PathBuf,

    /// Output format: html, word, or all.
    #[arg(short, long, default_value = "all", value_parser = parse_format)]
    format: FormatChoice,

    /// Directory to write exports to (overrides `export.download_dir`).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Base file name without extension (overrides `export.file_stem`).
    #[arg(long)]
    stem: Option<String>,

    /// Document title (overrides `export.title`).
    #[arg(long)]
    title: Option<String>,

    /// Export even if some QR placeholders cannot be resolved.
    #[arg(long)]
    allow_incomplete: bool,

    /// Prepend the table of contents to the exported body.
    #[arg(long)]
    toc: bool,

    /// Upload exports to this S3 bucket (overrides `upload.bucket`).
    #[arg(long, env = "FOLIO_UPLOAD_BUCKET")]
    upload_bucket: Option<String>,

    /// Path to configuration file (default: auto-discover folio.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormatChoice {
    One(ExportFormat),
    All,
}

fn parse_format(name: &str) -> Result<FormatChoice, String> {
    if name.eq_ignore_ascii_case("all") {
        return Ok(FormatChoice::All);
    }
    ExportFormat::from_name(name)
        .map(FormatChoice::One)
        .ok_or_else(|| format!("unknown format {name:?} (expected html, word or all)"))
}

impl ExportArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            download_dir: self.output_dir,
            file_stem: self.stem,
            title: self.title,
            allow_incomplete: self.allow_incomplete.then_some(true),
            upload_bucket: self.upload_bucket,
            ..Default::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let editor = open_editor(&self.file, &config)?;

        let mut body = editor.content();
        if self.toc {
            body.insert_str(0, &editor.outline().render_html());
        }

        let exporter = build_exporter(&config, &output)?;
        output.info(&format!(
            "Exporting {} to {}",
            self.file.display(),
            config.export.download_dir.display()
        ));

        let results = match self.format {
            FormatChoice::One(format) => vec![(format, exporter.export(&body, format))],
            FormatChoice::All => exporter.export_all(&body),
        };

        let mut first_error = None;
        for (format, result) in results {
            match result {
                Ok(report) => print_report(&output, &report),
                Err(err) => {
                    print_failure(&output, format, &err);
                    first_error.get_or_insert(err);
                }
            }
        }
        match first_error {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }
}

fn build_exporter(config: &Config, output: &Output) -> Result<Exporter, CliError> {
    let export = &config.export;
    let encoder = QrCodeEncoder::new()
        .with_module_size(export.qr_module_size)
        .with_margin(export.qr_margin);
    let shell = DocumentShell::new(export.title.as_str())
        .with_header(export.header.as_str())
        .with_footer(export.footer.as_str());

    let exporter = Exporter::new(DirectorySink::new(&export.download_dir))
        .with_resolver(PlaceholderResolver::new(encoder))
        .with_shell(shell)
        .with_options(ExportOptions {
            file_stem: export.file_stem.clone(),
            allow_incomplete: export.allow_incomplete,
        });

    let Some(upload) = &config.upload else {
        return Ok(exporter);
    };

    #[cfg(feature = "s3")]
    {
        let uploader = folio_export::S3Uploader::new(folio_export::S3Config {
            bucket: upload.bucket.clone(),
            region: upload.region.clone(),
            endpoint: upload.endpoint.clone(),
            prefix: upload.prefix.clone(),
        })?;
        output.info(&format!("Uploading to s3://{}", upload.bucket));
        Ok(exporter.with_uploader(uploader))
    }

    #[cfg(not(feature = "s3"))]
    {
        output.warning(&format!(
            "Upload to {} skipped: built without S3 support",
            upload.bucket
        ));
        Ok(exporter)
    }
}

fn print_report(output: &Output, report: &ExportReport) {
    output.artifact(report.format, &report.location, report.size);
    if let UploadStatus::Uploaded(url) = &report.upload {
        output.info(&format!("  uploaded: {url}"));
    }
    if report.incomplete {
        output.warning(&format!(
            "  {} placeholder(s) left unresolved",
            report.failures.len()
        ));
    }
    for warning in &report.warnings {
        output.warning(&format!("  warning: {warning}"));
    }
}

fn print_failure(output: &Output, format: ExportFormat, err: &ExportError) {
    output.error(&format!("{format}: {err}"));
    if let ExportError::Unresolved(failures) = err {
        for failure in failures {
            output.unresolved(failure.index, &failure.payload, &failure.message);
        }
        output.info("  Use --allow-incomplete to export anyway.");
    }
}
