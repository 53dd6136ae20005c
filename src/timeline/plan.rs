use crate::foundation::core::{FrameIndex, FrameRange, GeoPoint};
use crate::foundation::error::{TripReelError, TripReelResult};
use crate::session::config::ReelConfig;
use crate::trip::model::{Photo, TransportMode, TripInput};

/// A resolved, schedulable location: a stop or the synthetic starting location.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Waypoint {
    /// Stop id, `None` for the starting location.
    pub id: Option<String>,
    /// Display title.
    pub title: String,
    /// Coordinate.
    pub at: GeoPoint,
}

/// What a stage shows.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StageKind {
    /// Opening slide.
    Title {
        /// Trip title.
        text: String,
    },
    /// Camera travels between two waypoints with a transport icon.
    Travel {
        /// Leg origin.
        from: Waypoint,
        /// Leg destination.
        to: Waypoint,
        /// Icon selector.
        mode: TransportMode,
    },
    /// Camera settles on a stop without photos.
    Arrival {
        /// The stop.
        stop: Waypoint,
    },
    /// Photo carousel over the darkened map.
    Showcase {
        /// The stop.
        stop: Waypoint,
        /// Photos in display order, never empty.
        photos: Vec<Photo>,
        /// Darken transition length.
        intro_frames: u64,
        /// Display window per photo.
        photo_frames: u64,
        /// Undarken transition length.
        outro_frames: u64,
    },
    /// Closing slide.
    End {
        /// Closing text.
        text: String,
    },
}

/// Position within a showcase stage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ShowcasePhase {
    /// Darkening; `t` in `[0, 1]`.
    Intro {
        /// Transition progress.
        t: f64,
    },
    /// Photo `index` is centered; `local` counts frames since it became current.
    Photo {
        /// Current photo.
        index: usize,
        /// Frames since the photo became current.
        local: u64,
        /// Progress within the photo window.
        t: f64,
    },
    /// Undarkening; `t` in `[0, 1]`.
    Outro {
        /// Transition progress.
        t: f64,
    },
}

/// One scheduled unit of work.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Stage {
    /// Stage content.
    #[serde(flatten)]
    pub kind: StageKind,
    /// First frame of the stage.
    pub start: FrameIndex,
    /// Number of frames.
    pub frames: u64,
}

impl Stage {
    /// Frames covered by this stage.
    pub fn range(&self) -> FrameRange {
        FrameRange {
            start: self.start,
            end: FrameIndex(self.start.0 + self.frames),
        }
    }

    /// Human-readable status reported when the stage begins.
    pub fn status_text(&self) -> String {
        match &self.kind {
            StageKind::Title { .. } => "creating title\u{2026}".to_string(),
            StageKind::Travel { to, mode, .. } => {
                format!("{} to {}\u{2026}", mode.glyph(), to.title)
            }
            StageKind::Arrival { stop } => format!("arriving at {}\u{2026}", stop.title),
            StageKind::Showcase { stop, .. } => format!("photos at {}\u{2026}", stop.title),
            StageKind::End { .. } => "creating ending\u{2026}".to_string(),
        }
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match &self.kind {
            StageKind::Title { .. } => "title",
            StageKind::Travel { .. } => "travel",
            StageKind::Arrival { .. } => "arrival",
            StageKind::Showcase { .. } => "showcase",
            StageKind::End { .. } => "end",
        }
    }

    /// Showcase phase for a frame local to this stage. `None` for other stage kinds.
    pub fn showcase_phase(&self, local: u64) -> Option<ShowcasePhase> {
        let StageKind::Showcase {
            photos,
            intro_frames,
            photo_frames,
            outro_frames,
            ..
        } = &self.kind
        else {
            return None;
        };
        if local < *intro_frames {
            return Some(ShowcasePhase::Intro {
                t: crate::foundation::math::window_progress(local, *intro_frames),
            });
        }
        let body = photos.len() as u64 * photo_frames;
        let in_body = local - intro_frames;
        if in_body < body {
            let index = (in_body / photo_frames) as usize;
            let photo_local = in_body % photo_frames;
            return Some(ShowcasePhase::Photo {
                index,
                local: photo_local,
                t: crate::foundation::math::window_progress(photo_local, *photo_frames),
            });
        }
        Some(ShowcasePhase::Outro {
            t: crate::foundation::math::window_progress(in_body - body, *outro_frames),
        })
    }
}

/// The full, immutable schedule of a run.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StagePlan {
    /// Stages in playback order, contiguous from frame 0.
    pub stages: Vec<Stage>,
    /// Sum of all stage frame counts; the progress denominator.
    pub total_frames: u64,
    /// Where the camera starts: the starting location, else the first stop.
    pub initial_view: GeoPoint,
}

impl StagePlan {
    /// Expand a trip into its stage sequence.
    ///
    /// `Title -> [start leg] -> ([leg] -> Showcase | Arrival)* -> End`. Fails with a configuration
    /// error, before anything is allocated, when the trip cannot be scheduled.
    #[tracing::instrument(skip_all, fields(groups = trip.groups.len()))]
    pub fn build(trip: &TripInput, cfg: &ReelConfig) -> TripReelResult<Self> {
        cfg.validate()?;
        trip.validate()?;

        let fps = cfg.fps;
        let t = &cfg.timings;
        let mut stages = Vec::with_capacity(trip.groups.len() * 2 + 3);
        let mut cursor = 0u64;
        let mut push = |kind: StageKind, frames: u64, stages: &mut Vec<Stage>| {
            stages.push(Stage {
                kind,
                start: FrameIndex(cursor),
                frames,
            });
            cursor += frames;
        };

        push(
            StageKind::Title {
                text: trip.title.clone(),
            },
            fps.ms_to_frames(t.title_ms),
            &mut stages,
        );

        let mut prev: Option<Waypoint> = match trip.start.as_ref() {
            Some(start) => Some(Waypoint {
                id: None,
                title: start.title.clone(),
                at: start
                    .coord()
                    .ok_or_else(|| TripReelError::config("starting location has no coordinate"))?,
            }),
            None => None,
        };

        for group in &trip.groups {
            let here = Waypoint {
                id: Some(group.stop.id.clone()),
                title: group.stop.title.clone(),
                at: group.stop.coord().ok_or_else(|| {
                    TripReelError::config(format!("stop '{}' has no coordinate", group.stop.id))
                })?,
            };

            if let Some(from) = prev.take() {
                let mode = match from.id.as_deref() {
                    Some(from_id) => trip.mode_between(from_id, &group.stop.id),
                    None => trip.start.as_ref().map(|s| s.mode).unwrap_or_default(),
                };
                push(
                    StageKind::Travel {
                        from,
                        to: here.clone(),
                        mode,
                    },
                    fps.ms_to_frames(t.travel_ms),
                    &mut stages,
                );
            }

            if group.photos.is_empty() {
                push(
                    StageKind::Arrival { stop: here.clone() },
                    fps.ms_to_frames(t.visit_ms),
                    &mut stages,
                );
            } else {
                let intro_frames = fps.ms_to_frames(t.showcase_intro_ms);
                let photo_frames = fps.ms_to_frames(t.photo_ms);
                let outro_frames = fps.ms_to_frames(t.showcase_outro_ms);
                let frames =
                    intro_frames + group.photos.len() as u64 * photo_frames + outro_frames;
                push(
                    StageKind::Showcase {
                        stop: here.clone(),
                        photos: group.photos.clone(),
                        intro_frames,
                        photo_frames,
                        outro_frames,
                    },
                    frames,
                    &mut stages,
                );
            }

            prev = Some(here);
        }

        push(
            StageKind::End {
                text: cfg.end_text.clone(),
            },
            fps.ms_to_frames(t.end_ms),
            &mut stages,
        );

        let initial_view = match trip.start.as_ref().and_then(|s| s.coord()) {
            Some(p) => p,
            None => stages
                .iter()
                .find_map(|s| match &s.kind {
                    StageKind::Arrival { stop } | StageKind::Showcase { stop, .. } => Some(stop.at),
                    _ => None,
                })
                .ok_or_else(|| TripReelError::config("trip has no schedulable stop"))?,
        };

        tracing::debug!(stages = stages.len(), total_frames = cursor, "stage plan built");
        Ok(Self {
            stages,
            total_frames: cursor,
            initial_view,
        })
    }

    /// Index of the stage containing `frame`.
    pub fn stage_index_at(&self, frame: FrameIndex) -> Option<usize> {
        self.stages.iter().position(|s| s.range().contains(frame))
    }

    /// Total duration in milliseconds at the plan's frame rate.
    pub fn duration_ms(&self, fps: crate::foundation::core::Fps) -> f64 {
        fps.frames_to_ms(self.total_frames)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/plan.rs"]
mod tests;
