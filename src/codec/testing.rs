//! Scripted engine used by unit tests across the crate.

use super::{
    CodecEngine, EncodeOutcome, EngineBackend, EngineParams, EngineStatus, MemoryOperator,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Bytes produced per frame when no outcome is scripted.
pub const DEFAULT_OUTPUT_LEN: usize = 100;

#[derive(Default)]
pub struct EngineLog {
    pub created: usize,
    /// Allocator handed to each `create` call, in order.
    pub memory: Vec<Arc<dyn MemoryOperator>>,
    pub released: usize,
    pub params: Vec<EngineParams>,
    /// Input length of every `encode_frame` call, in order.
    pub calls: Vec<usize>,
    pub output_capacities: Vec<usize>,
}

#[derive(Default)]
struct Script {
    outcomes: VecDeque<EncodeOutcome>,
    reject_params: Option<EngineStatus>,
    fail_create: Option<EngineStatus>,
}

/// Backend whose engines replay scripted outcomes and record every call.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    log: Arc<Mutex<EngineLog>>,
    script: Arc<Mutex<Script>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue outcomes returned by subsequent `encode_frame` calls, in order.
    pub fn push_outcomes(&self, outcomes: impl IntoIterator<Item = EncodeOutcome>) {
        self.script.lock().unwrap().outcomes.extend(outcomes);
    }

    pub fn reject_params(&self, status: EngineStatus) {
        self.script.lock().unwrap().reject_params = Some(status);
    }

    pub fn fail_create(&self, status: EngineStatus) {
        self.script.lock().unwrap().fail_create = Some(status);
    }

    pub fn log(&self) -> std::sync::MutexGuard<'_, EngineLog> {
        self.log.lock().unwrap()
    }

    pub fn call_count(&self) -> usize {
        self.log().calls.len()
    }
}

impl EngineBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn create(
        &self,
        memory: Arc<dyn MemoryOperator>,
    ) -> Result<Box<dyn CodecEngine>, EngineStatus> {
        if let Some(status) = self.script.lock().unwrap().fail_create {
            return Err(status);
        }
        let mut log = self.log.lock().unwrap();
        log.created += 1;
        log.memory.push(memory);
        drop(log);
        Ok(Box::new(ScriptedEngine {
            log: self.log.clone(),
            script: self.script.clone(),
        }))
    }
}

struct ScriptedEngine {
    log: Arc<Mutex<EngineLog>>,
    script: Arc<Mutex<Script>>,
}

impl CodecEngine for ScriptedEngine {
    fn set_params(&mut self, params: &EngineParams) -> EngineStatus {
        self.log.lock().unwrap().params.push(*params);
        self.script
            .lock()
            .unwrap()
            .reject_params
            .unwrap_or(EngineStatus::Success)
    }

    fn encode_frame(&mut self, input: &[u8], output: &mut [u8]) -> EncodeOutcome {
        let call_index = {
            let mut log = self.log.lock().unwrap();
            log.calls.push(input.len());
            log.output_capacities.push(output.len());
            log.calls.len() - 1
        };

        let mut outcome = self
            .script
            .lock()
            .unwrap()
            .outcomes
            .pop_front()
            .unwrap_or_else(|| EncodeOutcome::success(DEFAULT_OUTPUT_LEN, input.len()));
        outcome.output_len = outcome.output_len.min(output.len());
        output[..outcome.output_len].fill(call_index as u8);
        outcome
    }
}

impl Drop for ScriptedEngine {
    fn drop(&mut self) {
        if let Ok(mut log) = self.log.lock() {
            log.released += 1;
        }
    }
}

/// Memory operator that counts outstanding buffers.
#[derive(Default)]
pub struct CountingMemory {
    pub allocated: AtomicUsize,
    pub released: AtomicUsize,
}

impl CountingMemory {
    pub fn outstanding(&self) -> usize {
        self.allocated.load(Ordering::SeqCst) - self.released.load(Ordering::SeqCst)
    }
}

impl MemoryOperator for CountingMemory {
    fn allocate(&self, len: usize) -> Vec<u8> {
        self.allocated.fetch_add(1, Ordering::SeqCst);
        vec![0u8; len]
    }

    fn release(&self, buffer: Vec<u8>) {
        self.released.fetch_add(1, Ordering::SeqCst);
        drop(buffer);
    }
}
