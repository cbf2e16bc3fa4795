//! Decode, quantize, retune and encode in one call.
use crate::binutil::ParseError;
use crate::chip::ClockPair;
use crate::convert::{ConvertConfig, ConvertError, ConvertReport, Quantizer, Retuner};
use crate::vgm::command::Operation;
use crate::vgm::parser::{command_area, parse_commands, parse_gd3_at, parse_vgm_header};
use crate::vgm::writer::encode_operations;
use crate::vgm::{OUTPUT_VERSION, VgmDocument, VgmHeader};

/// Bare command bytes plus the facts a container would normally supply.
#[derive(Debug, Clone, Copy)]
pub struct CommandInput<'a> {
    pub bytes: &'a [u8],
    /// Offset of the first command in `bytes`.
    pub start: usize,
    /// Declared length of the tune in samples.
    pub total_samples: u32,
    /// Decode `0x30` writes for a second chip instead of dropping them.
    pub dual_chip: bool,
    pub clocks: ClockPair,
}

/// Converted commands.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOutput {
    /// Encoded commands, or the whole file for `Converter::convert_vgm`.
    pub bytes: Vec<u8>,
    pub operations: Vec<Operation>,
    pub total_samples: u32,
    pub clocks: ClockPair,
    pub report: ConvertReport,
}

/// Runs conversions with a fixed `ConvertConfig`.
#[derive(Debug, Clone)]
pub struct Converter {
    config: ConvertConfig,
    tick_samples: u32,
}

impl Converter {
    /// Validate `config` and build a converter around it.
    pub fn new(config: ConvertConfig) -> Result<Self, ConvertError> {
        config.validate()?;
        let tick_samples = config.tick_samples()?;
        Ok(Converter {
            config,
            tick_samples,
        })
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    pub fn tick_samples(&self) -> u32 {
        self.tick_samples
    }

    /// Quantize and retune an already decoded operation list.
    pub fn convert_operations(
        &self,
        ops: &[Operation],
        total_samples: u32,
        clocks: ClockPair,
    ) -> Result<(Vec<Operation>, ConvertReport), ConvertError> {
        let quantizer = Quantizer::new(
            self.tick_samples,
            self.config.optimize_writes,
            self.config.channel_filter,
        );
        let (mut quantized, q) = quantizer.quantize(ops, total_samples);

        let r = if self.config.retune {
            Retuner::new(clocks, self.config.retune_periodic_noise, self.config.overflow)
                .retune(&mut quantized)?
        } else {
            Default::default()
        };

        let report = ConvertReport {
            input_operations: ops.len(),
            output_operations: quantized.len(),
            tick_samples: self.tick_samples,
            ticks_emitted: q.ticks_emitted,
            redundant_writes_removed: q.redundant_writes_removed,
            filtered_writes: q.filtered_writes,
            dropped_foreign: q.dropped_foreign,
            retuned_tones: r.retuned,
            clamped_tones: r.clamped,
            degenerate_tones: r.degenerate,
            unpaired_tone_data: r.unpaired_data,
            ..ConvertReport::default()
        };
        Ok((quantized, report))
    }

    /// Convert bare command bytes.
    pub fn convert_stream(&self, input: &CommandInput<'_>) -> Result<ConvertOutput, ConvertError> {
        let stream = parse_commands(input.bytes, input.start, input.dual_chip)
            .map_err(ConvertError::MalformedStream)?;

        let (operations, mut report) =
            self.convert_operations(&stream.operations, input.total_samples, input.clocks)?;
        let bytes = encode_operations(&operations);

        report.input_bytes = input.bytes.len().saturating_sub(input.start);
        report.output_bytes = bytes.len();
        report.dropped_secondary = stream.dropped_secondary_writes;
        report.dropped_data_blocks = stream.data_blocks.len();

        log::debug!(
            "converted {} bytes ({} ops) into {} bytes ({} ops)",
            report.input_bytes,
            report.input_operations,
            report.output_bytes,
            report.output_operations
        );

        Ok(ConvertOutput {
            bytes,
            operations,
            total_samples: input.total_samples,
            clocks: input.clocks,
            report,
        })
    }

    /// Convert a complete VGM file and re-frame it.
    ///
    /// `ConvertOutput::bytes` holds the new file: a 1.51 header for the
    /// target chip, the converted commands and the source GD3 tags.
    pub fn convert_vgm(&self, bytes: &[u8]) -> Result<ConvertOutput, ConvertError> {
        let header = parse_vgm_header(bytes).map_err(ConvertError::from_container)?;
        let source_hz = header.sn76489_clock_hz();
        if source_hz == 0 {
            return Err(ConvertError::InvalidContainer(ParseError::Other(
                "file has no SN76489 clock".into(),
            )));
        }
        let dual_chip = header.is_dual_chip() && !self.config.strip_dual_chip;
        let target_hz = self.config.target.map_or(source_hz, |t| t.clock_hz);
        let clocks = ClockPair::new(source_hz, target_hz);

        log::debug!(
            "vgm {}: {} Hz{}, {} samples, data at 0x{:X}",
            crate::convert::version_string(header.version),
            source_hz,
            if header.is_dual_chip() { " (dual)" } else { "" },
            header.total_samples,
            header.data_start()
        );

        let mut output = self.convert_stream(&CommandInput {
            bytes: command_area(&header, bytes),
            start: header.data_start(),
            total_samples: header.total_samples,
            dual_chip,
            clocks,
        })?;
        let gd3 = parse_gd3_at(&header, bytes).map_err(ConvertError::InvalidContainer)?;

        let document = VgmDocument::new(
            self.output_header(&header, dual_chip),
            std::mem::take(&mut output.operations),
            gd3,
        );
        output.bytes = document.to_bytes();
        output.operations = document.commands.operations;
        Ok(output)
    }

    fn output_header(&self, source: &VgmHeader, dual_chip: bool) -> VgmHeader {
        let mut header = VgmHeader {
            version: OUTPUT_VERSION,
            // Commands for these chips were dropped.
            ym2413_clock: 0,
            ym2612_clock: 0,
            ym2151_clock: 0,
            ..source.clone()
        };
        if let Some(target) = self.config.target {
            header.sn76489_clock = target.clock_hz;
            header.sn_fb = target.feedback;
            header.snw = target.shift_register_width;
        }
        if dual_chip {
            header.sn76489_clock |= crate::vgm::DUAL_CHIP_FLAG;
        } else {
            header.clear_dual_chip();
        }
        header
    }
}
