use std::path::PathBuf;
use std::process::Command;

use super::{ImageGenError, ImageGenerator, ImageHandle, ImageRequest};
use crate::config::ImageGenConfig;

/// Environment variable carrying the image id of the first member.
pub const FIRST_ID_ENV: &str = "HYPERTILE_FIRST_ID";

/// Runs an external program once per request.
///
/// The program receives the configured arguments followed by
///
/// ```text
/// <world_count> (<id> <x> <z>)* (<x> <z>)*
/// ```
///
/// world tiles first, then members. Members carry consecutive image ids
/// starting at `$HYPERTILE_FIRST_ID`, and the program must write
/// `<output_dir>/tile<id>.png` for each.
pub struct CommandGenerator {
    config: ImageGenConfig,
}

impl CommandGenerator {
    pub fn new(config: ImageGenConfig) -> Self {
        Self { config }
    }

    pub fn output_path(&self, image_id: u64) -> PathBuf {
        self.config.output_dir.join(format!("tile{image_id}.png"))
    }

    /// Tile arguments for `request`, without the configured prefix.
    pub fn tile_arguments(request: &ImageRequest) -> Vec<String> {
        let mut args = Vec::with_capacity(1 + 3 * request.world.len() + 2 * request.members.len());
        args.push(request.world.len().to_string());
        for tile in &request.world {
            args.push(tile.image_id.to_string());
            args.push(format!("{:.6}", tile.x));
            args.push(format!("{:.6}", tile.z));
        }
        for tile in &request.members {
            args.push(format!("{:.6}", tile.x));
            args.push(format!("{:.6}", tile.z));
        }
        args
    }
}

impl ImageGenerator for CommandGenerator {
    fn generate(&self, request: &ImageRequest) -> Result<Vec<(u64, ImageHandle)>, ImageGenError> {
        let program = &self.config.program;
        let mut command = Command::new(program);
        command
            .args(&self.config.args)
            .args(Self::tile_arguments(request));
        if let Some(first) = request.members.first() {
            command.env(FIRST_ID_ENV, first.image_id.to_string());
        }
        log::debug!("running {:?}", command);

        let status = command.status().map_err(|source| ImageGenError::Spawn {
            program: program.clone(),
            source,
        })?;
        if !status.success() {
            return Err(ImageGenError::ExitStatus {
                program: program.clone(),
                status: status.to_string(),
            });
        }

        request
            .members
            .iter()
            .map(|tile| {
                let path = self.output_path(tile.image_id);
                if path.is_file() {
                    Ok((tile.image_id, ImageHandle::new(path)))
                } else {
                    Err(ImageGenError::MissingOutput { path })
                }
            })
            .collect()
    }
}
