use read_aloud_core::config::WidgetPosition;
use read_aloud_core::controller::{PlaybackSnapshot, SpeedPresetView};
use read_aloud_core::playback::{PlaybackStatus, VoiceParams};
use read_aloud_core::voices::VoiceView;
use read_aloud_core::{SentenceUnit, SourceRef, UtteranceErrorKind, Voice};
use std::fs;
use std::path::Path;
use ts_rs::TS;

fn export_single_type<T: TS + 'static>(out_dir: &Path) -> Result<(), String> {
    T::export_all_to(out_dir).map_err(|err| err.to_string())
}

fn export_ts_bindings(out_dir: &Path) -> Result<(), String> {
    fs::create_dir_all(out_dir)
        .map_err(|err| format!("Failed to create {}: {err}", out_dir.display()))?;

    for entry in fs::read_dir(out_dir)
        .map_err(|err| format!("Failed to list {}: {err}", out_dir.display()))?
    {
        let entry = entry.map_err(|err| format!("Failed to read entry: {err}"))?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("ts") {
            fs::remove_file(&path)
                .map_err(|err| format!("Failed to remove {}: {err}", path.display()))?;
        }
    }

    export_single_type::<PlaybackSnapshot>(out_dir)?;
    export_single_type::<PlaybackStatus>(out_dir)?;
    export_single_type::<VoiceParams>(out_dir)?;
    export_single_type::<VoiceView>(out_dir)?;
    export_single_type::<SpeedPresetView>(out_dir)?;
    export_single_type::<WidgetPosition>(out_dir)?;
    export_single_type::<SourceRef>(out_dir)?;
    export_single_type::<SentenceUnit>(out_dir)?;
    export_single_type::<Voice>(out_dir)?;
    export_single_type::<UtteranceErrorKind>(out_dir)?;

    let index_content = r#"export type { PlaybackSnapshot } from "./PlaybackSnapshot";
export type { PlaybackStatus } from "./PlaybackStatus";
export type { VoiceParams } from "./VoiceParams";
export type { VoiceView } from "./VoiceView";
export type { SpeedPresetView } from "./SpeedPresetView";
export type { WidgetPosition } from "./WidgetPosition";
export type { SourceRef } from "./SourceRef";
export type { SentenceUnit } from "./SentenceUnit";
export type { Voice } from "./Voice";
export type { UtteranceErrorKind } from "./UtteranceErrorKind";
"#;

    fs::write(out_dir.join("index.ts"), index_content).map_err(|err| {
        format!(
            "Failed to write {}: {err}",
            out_dir.join("index.ts").display()
        )
    })?;

    Ok(())
}

fn main() {
    let out_dir = Path::new("bindings");
    if let Err(err) = export_ts_bindings(out_dir) {
        eprintln!("failed to export TS bindings: {err}");
        std::process::exit(1);
    }
    println!("exported TS bindings to {}", out_dir.display());
}
