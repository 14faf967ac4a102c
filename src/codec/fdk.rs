//! fdk-aac backed engine.

use super::{CodecEngine, EncodeOutcome, EngineBackend, EngineParams, EngineStatus, MemoryOperator};
use fdk_aac::enc::{BitRate, ChannelMode, Encoder, EncoderParams, Transport};
use std::sync::Arc;

const INVALID_ARG: u32 = 0x8000_0004;
const WRONG_STATUS: u32 = 0x8000_0007;
const FAILED: u32 = 0x8000_0001;

/// Creates AAC-LC engines backed by libfdk-aac.
///
/// libfdk-aac allocates its own state internally, so the memory operator is
/// not consulted.
#[derive(Debug, Default, Clone, Copy)]
pub struct FdkBackend;

impl EngineBackend for FdkBackend {
    fn name(&self) -> &'static str {
        "fdk-aac"
    }

    fn create(
        &self,
        _memory: Arc<dyn MemoryOperator>,
    ) -> Result<Box<dyn CodecEngine>, EngineStatus> {
        Ok(Box::new(FdkEngine {
            encoder: None,
            samples: Vec::new(),
        }))
    }
}

struct FdkEngine {
    encoder: Option<Encoder>,
    samples: Vec<i16>,
}

impl CodecEngine for FdkEngine {
    fn set_params(&mut self, params: &EngineParams) -> EngineStatus {
        let channels = match params.channels {
            1 => ChannelMode::Mono,
            2 => ChannelMode::Stereo,
            _ => return EngineStatus::Other(INVALID_ARG),
        };
        if !params.adts {
            return EngineStatus::Other(INVALID_ARG);
        }

        let encoder_params = EncoderParams {
            bit_rate: BitRate::Cbr(params.bit_rate),
            sample_rate: params.sample_rate,
            transport: Transport::Adts,
            channels,
        };

        match Encoder::new(encoder_params) {
            Ok(encoder) => {
                self.encoder = Some(encoder);
                EngineStatus::Success
            }
            Err(e) => {
                tracing::warn!("fdk-aac rejected parameters: {:?}", e);
                EngineStatus::Other(INVALID_ARG)
            }
        }
    }

    fn encode_frame(&mut self, input: &[u8], output: &mut [u8]) -> EncodeOutcome {
        let Some(encoder) = self.encoder.as_mut() else {
            return EncodeOutcome::with_status(EngineStatus::Other(WRONG_STATUS));
        };

        self.samples.clear();
        self.samples.extend(
            input
                .chunks_exact(2)
                .map(|pair| i16::from_le_bytes([pair[0], pair[1]])),
        );

        match encoder.encode(&self.samples, output) {
            Ok(info) => {
                let input_consumed = info.input_consumed * 2;
                let status = if input_consumed < input.len() {
                    EngineStatus::OutputBufferTooSmall
                } else {
                    EngineStatus::Success
                };
                EncodeOutcome {
                    status,
                    output_len: info.output_size,
                    input_consumed,
                }
            }
            Err(e) => {
                // fdk_aac's error type does not expose the raw AACENC_ERROR,
                // so every failure maps to the generic failure code.
                tracing::warn!("fdk-aac encode error: {:?}", e);
                EncodeOutcome::with_status(EngineStatus::Other(FAILED))
            }
        }
    }
}
