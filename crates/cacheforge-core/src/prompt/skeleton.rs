//! Fixed CRC2 replacement-policy skeleton and authoring rules.
//!
//! Every generated candidate is linked against the prebuilt simulator
//! library, so it must define exactly these five entry points with these
//! signatures.

/// Header every candidate must include first.
pub const SIMULATOR_HEADER: &str = "../inc/champsim_crc2.h";

/// Number of LLC sets the simulator is built with.
pub const LLC_SETS: u32 = 2048;

/// LLC associativity.
pub const LLC_WAYS: u32 = 16;

/// The five functions the simulator calls into.
pub const ENTRY_POINTS: [&str; 5] = [
    "InitReplacementState",
    "GetVictimInSet",
    "UpdateReplacementState",
    "PrintStats",
    "PrintStats_Heartbeat",
];

/// Skeleton source shown to the model (without the surrounding fence).
pub const POLICY_SKELETON: &str = r#"#include <vector>
#include <cstdint>
#include <iostream>
#include "../inc/champsim_crc2.h"

#define NUM_CORE 1
#define LLC_SETS (NUM_CORE * 2048)
#define LLC_WAYS 16

// Initialize replacement state
void InitReplacementState() {
    // --- IMPLEMENT THE FUNCTION ---
}

// Find victim in the set
uint32_t GetVictimInSet(
    uint32_t cpu,
    uint32_t set,
    const BLOCK *current_set,
    uint64_t PC,
    uint64_t paddr,
    uint32_t type
) {
    // --- IMPLEMENT THE FUNCTION ---
    return 0; // replaced block index
}

// Update replacement state
void UpdateReplacementState(
    uint32_t cpu,
    uint32_t set,
    uint32_t way,
    uint64_t paddr,
    uint64_t PC,
    uint64_t victim_addr,
    uint32_t type,
    uint8_t hit
) {
    // --- IMPLEMENT THE FUNCTION ---
}

// Print end-of-simulation statistics
void PrintStats() {
    // --- IMPLEMENT THE FUNCTION ---
}

// Print periodic (heartbeat) statistics
void PrintStats_Heartbeat() {
    // --- IMPLEMENT THE FUNCTION ---
}"#;

/// Authoring rules appended to every generation prompt.
pub fn guidelines() -> Vec<String> {
    vec![
        format!("Include \"{SIMULATOR_HEADER}\" at the very top."),
        format!("Implement all five functions: {}.", ENTRY_POINTS.join(", ")),
        format!(
            "In GetVictimInSet, **do not bypass** (i.e., return `LLC_WAYS`) on **WRITEBACK** accesses. \
             Bypass is only allowed for LOAD/RFO/PREFETCH when the predictor says the line is 'cold'. \
             The cache has {LLC_SETS} sets of {LLC_WAYS} ways."
        ),
        "Use the BLOCK* current_set pointer and check its .valid field for empty ways.".to_string(),
        "Combine the best ideas; add comments to explain design choices.".to_string(),
    ]
}

/// Render the guidelines as a numbered Markdown section.
pub fn render_guidelines() -> String {
    let mut out = String::from("# Guidelines\n");
    for (i, rule) in guidelines().iter().enumerate() {
        out.push_str(&format!("{}. {rule}\n", i + 1));
    }
    out
}
