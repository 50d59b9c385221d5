// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Setup shared by every bake mode

use roomscan_core::FrameRecord;
use roomscan_geometry::TriangleSoup;
use tracing::info;

use crate::config::{BakeConfig, ZSignPolicy};
use crate::exposure::frame_gains;
use crate::frames::{pick_evenly, FrameCache, FrameLoader, LoadedFrame};
use crate::report::BakeReport;
use crate::zsign::choose_z_sign;

/// Frames decoded for one bake, plus the chosen forward sign
pub(crate) struct Session {
    pub frames: Vec<LoadedFrame>,
    pub z_sign: f32,
    pub report: BakeReport,
}

impl Session {
    /// Pick, decode and (optionally) exposure-equalise the frames
    ///
    /// The frame cache lives only for the duration of this call; decoded
    /// images are then owned by the session and dropped with it.
    pub fn open(
        soup: &TriangleSoup,
        records: &[FrameRecord],
        loader: &dyn FrameLoader,
        config: &BakeConfig,
        equalise: bool,
        targets: usize,
    ) -> Self {
        let mut report = BakeReport::new(config.mode, targets);
        report.frames_available = records.len();

        let picked = pick_evenly(records, config.max_frames);
        report.frames_picked = picked.len();

        let mut cache = FrameCache::new();
        let mut frames = Vec::with_capacity(picked.len());
        for record in picked {
            match cache.get_or_load(loader, &record.file, config.downscale_max_w) {
                Some(image) => frames.push(LoadedFrame {
                    record: record.clone(),
                    image,
                    gain: 1.0,
                }),
                None => report.frames_missing += 1,
            }
        }
        report.frames_loaded = frames.len();

        if equalise && !frames.is_empty() {
            let gains = frame_gains(
                frames.iter().map(|f| &f.image.image),
                config.gain_min,
                config.gain_max,
            );
            for (frame, gain) in frames.iter_mut().zip(gains) {
                frame.gain = gain;
            }
        }

        let z_sign = match config.z_sign {
            ZSignPolicy::Fixed(sign) => sign,
            ZSignPolicy::Auto => choose_z_sign(
                &frames,
                &soup.positions,
                config.min_z,
                config.z_sign_probe_frames,
                config.z_sign_probe_vertices,
            ),
        };
        report.z_sign = z_sign;

        info!(
            mode = config.mode.name(),
            picked = report.frames_picked,
            loaded = report.frames_loaded,
            missing = report.frames_missing,
            z_sign,
            "bake session ready"
        );

        Self {
            frames,
            z_sign,
            report,
        }
    }

    /// Close the session, logging coverage
    pub fn finish(self) -> BakeReport {
        let r = &self.report;
        info!(
            mode = r.mode.name(),
            targets = r.targets,
            painted = r.painted,
            relaxed = r.relaxed,
            fallback = r.fallback,
            defaulted = r.defaulted,
            cancelled = r.cancelled,
            "bake finished"
        );
        self.report
    }
}
