//! Colon-delimited `key: value` formats: `lscpu` and `/proc/cpuinfo`.

use std::collections::BTreeMap;

/// One flat record of `lscpu` fields keyed by normalized name.
pub type CpuSummary = BTreeMap<String, String>;

/// The fields of a single logical processor from `/proc/cpuinfo`.
pub type ProcessorRecord = BTreeMap<String, String>;

/// Key given to the processor index, whose label is consumed when the
/// listing is split into per-core blocks.
pub const PROCESSOR_NUMBER_KEY: &str = "processor_number";

const PROCESSOR_TOKEN: &str = "processor";

/// Parse `lscpu` output into a single record.
///
/// Each line is split at its first colon; lines without one are skipped.
/// Later duplicates of a key overwrite earlier ones.
pub fn parse_summary(text: &str) -> CpuSummary {
    let mut summary = CpuSummary::new();
    for line in text.lines() {
        if let Some((key, value)) = line.split_once(':') {
            summary.insert(normalize_summary_key(key), value.trim().to_string());
        }
    }
    summary
}

/// `"Model name"` -> `"model_name"`, `"NUMA node0 CPU(s)"` -> `"numa_node0_cpus"`.
pub fn normalize_summary_key(key: &str) -> String {
    key.chars()
        .filter(|c| !matches!(c, '(' | ')'))
        .map(|c| if matches!(c, ' ' | '-') { '_' } else { c })
        .collect::<String>()
        .to_lowercase()
}

/// Parse raw `/proc/cpuinfo` into one record per processor, in listing order.
///
/// Tabs are removed and the text is cut on every occurrence of the literal
/// `processor`, so each block starts with the `: N` remainder of its
/// `processor\t: N` line; that empty-keyed line becomes
/// [`PROCESSOR_NUMBER_KEY`]. Only lines with exactly one colon contribute a
/// field. Keys have spaces replaced by underscores and are otherwise kept
/// as written.
pub fn parse_processors(text: &str) -> Vec<ProcessorRecord> {
    let text = text.replace('\t', "");
    text.split(PROCESSOR_TOKEN)
        .filter(|block| !block.is_empty())
        .map(parse_processor_block)
        .collect()
}

fn parse_processor_block(block: &str) -> ProcessorRecord {
    let mut record = ProcessorRecord::new();
    for line in block.lines() {
        let mut parts = line.split(':');
        let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
            continue;
        };
        let key = if key.is_empty() {
            PROCESSOR_NUMBER_KEY.to_string()
        } else {
            key.replace(' ', "_")
        };
        record.insert(key, value.trim().to_string());
    }
    record
}
