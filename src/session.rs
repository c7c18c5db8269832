use image::RgbImage;
use nalgebra as na;
use tracing::{debug, info, warn};

use crate::bbox::{BBox, Ltrb};
use crate::color::{self, Hsv};
use crate::config::Config;
use crate::detection::{Detection, PlayerObservation};
use crate::events::{Event, EventSink, FoulEvent, ShotEvent, TeamSeeded};
use crate::filter;
use crate::foul::FoulDetector;
use crate::frame::Frame;
use crate::history::{BallHistory, HoopHistory};
use crate::render::{FrameReport, Overlays, PlayerBox, Scoreboard};
use crate::shot::{self, Resolution, ShotAttempt, ShotTransition};
use crate::team::{Assignment, TeamClassifier, TeamSlot};
use crate::tracker::PlayerTracker;

/// All state carried from one frame to the next for a single video.
///
/// Frames must be fed in order. A frame index lower than the previous one is
/// taken as a backward seek: newer history is dropped and any open attempt
/// is abandoned.
pub struct Session {
    config: Config,
    ball: BallHistory,
    hoop: HoopHistory,
    teams: TeamClassifier,
    trackers: [PlayerTracker; 2],
    attempt: ShotAttempt,
    fouls: FoulDetector,
    scoreboard: Scoreboard,
    overlays: Overlays,
    last_shot_points: Option<u8>,
    last_frame: Option<u64>,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self {
            ball: BallHistory::unbounded(),
            hoop: HoopHistory::bounded(config.filter.hoop_capacity),
            teams: TeamClassifier::new(&config.team),
            trackers: [
                PlayerTracker::new(TeamSlot::A, config.tracker.clone()),
                PlayerTracker::new(TeamSlot::B, config.tracker.clone()),
            ],
            attempt: ShotAttempt::default(),
            fouls: FoulDetector::new(config.foul.clone()),
            scoreboard: Scoreboard::default(),
            overlays: Overlays::new(config.render.clone()),
            last_shot_points: None,
            last_frame: None,
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn ball_history(&self) -> &BallHistory {
        &self.ball
    }

    #[inline]
    pub fn hoop_history(&self) -> &HoopHistory {
        &self.hoop
    }

    #[inline]
    pub fn teams(&self) -> &TeamClassifier {
        &self.teams
    }

    #[inline]
    pub fn tracker(&self, team: TeamSlot) -> &PlayerTracker {
        &self.trackers[team.index()]
    }

    #[inline]
    pub fn attempt(&self) -> &ShotAttempt {
        &self.attempt
    }

    #[inline]
    pub fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    #[inline]
    pub fn last_frame(&self) -> Option<u64> {
        self.last_frame
    }

    /// Runs one frame through every stage. Events are handed to `sink` as
    /// they are produced; a failing sink is logged and otherwise ignored.
    pub fn process<E: EventSink + ?Sized>(
        &mut self,
        frame: &Frame,
        image: &RgbImage,
        sink: &mut E,
    ) -> FrameReport {
        let index = frame.index;

        if self.last_frame.map_or(false, |last| index < last) {
            self.rewind(index);
        }
        self.last_frame = Some(index);

        let mut events = Vec::new();

        self.ingest_objects(frame);
        let players = self.observe_players(frame, image, &mut events);

        let (attempt, transition) = shot::step(
            &self.attempt,
            &self.ball,
            &self.hoop,
            index,
            &self.config.shot,
            &self.config.score,
        );
        self.attempt = attempt;

        if let Some(ShotTransition::Resolved(resolution)) = transition {
            self.resolve(index, &resolution, &mut events);
        }

        if let Some(foul) = self.fouls.check(index, &players, &self.teams) {
            self.overlays.show_foul(self.config.team_name(foul.team));
            events.push(Event::Foul(FoulEvent {
                match_id: self.config.match_id,
                frame: index,
                team: foul.team,
                time: index as f32 / self.config.fps,
            }));
        }

        for event in &events {
            if let Err(err) = sink.emit(event) {
                warn!(%err, frame = index, "event sink rejected event");
            }
        }

        let report = self.report(index, events);
        self.overlays.tick();

        report
    }

    fn rewind(&mut self, index: u64) {
        debug!(index, "backward seek");

        filter::age_out(&mut self.ball, index, self.config.filter.ball_max_age);
        filter::age_out(&mut self.hoop, index, self.config.filter.hoop_max_age);

        self.attempt = ShotAttempt::default();
        self.fouls.rewind(index);
        self.overlays.clear();
    }

    fn ingest_objects(&mut self, frame: &Frame) {
        let index = frame.index;
        let gate = &self.config.gate;
        let cfg = &self.config.filter;

        for raw in frame.balls(gate) {
            self.ball.push(Detection::from_raw(raw, index));
            filter::clean_ball(&mut self.ball, index, cfg);
        }

        for raw in frame.hoops(gate) {
            self.hoop.push(Detection::from_raw(raw, index));
            filter::clean_hoop(&mut self.hoop, index, cfg);
        }

        filter::age_out(&mut self.ball, index, cfg.ball_max_age);
        filter::age_out(&mut self.hoop, index, cfg.hoop_max_age);
    }

    fn observe_players(
        &mut self,
        frame: &Frame,
        image: &RgbImage,
        events: &mut Vec<Event>,
    ) -> Vec<PlayerObservation> {
        let min_sv = self.config.team.min_saturation_value;
        let mut observed: Vec<(BBox<Ltrb>, Hsv, TeamSlot)> = Vec::new();

        for raw in frame.players(&self.config.gate) {
            let hsv = match color::torso_hsv(image, &raw.bbox, min_sv) {
                Ok(hsv) => hsv,
                Err(err) => {
                    debug!(%err, frame = frame.index, "skipping player");
                    continue;
                }
            };

            let assignment = self.teams.classify(hsv);

            if let Assignment::Seeded(team) = assignment {
                if let Some(rep) = self.teams.representative(team) {
                    events.push(Event::TeamSeeded(TeamSeeded {
                        match_id: self.config.match_id,
                        team,
                        hsv: rep,
                    }));
                }
            }

            observed.push((raw.bbox, hsv, assignment.slot()));
        }

        let mut players = Vec::with_capacity(observed.len());

        for team in TeamSlot::ALL {
            let (boxes, colors): (Vec<BBox<Ltrb>>, Vec<Hsv>) = observed
                .iter()
                .filter(|o| o.2 == team)
                .map(|o| (o.0, o.1))
                .unzip();

            let ids = self.trackers[team.index()].update(&boxes);

            players.extend(boxes.into_iter().zip(colors).zip(ids).map(|((bbox, hsv), id)| {
                PlayerObservation {
                    bbox,
                    hsv,
                    team,
                    id,
                }
            }));
        }

        players
    }

    fn resolve(&mut self, index: u64, resolution: &Resolution, events: &mut Vec<Event>) {
        let team = if resolution.made {
            self.scoring_team(&resolution.ball)
        } else {
            None
        };

        self.scoreboard.record(resolution.made, team, resolution.points);
        self.overlays.show_shot(resolution.made, resolution.points);
        self.last_shot_points = Some(resolution.points);

        info!(
            frame = index,
            made = resolution.made,
            points = resolution.points,
            team = ?team,
            "shot attempt"
        );

        events.push(Event::Shot(ShotEvent {
            match_id: self.config.match_id,
            frame: index,
            team,
            points: resolution.points,
            made: resolution.made,
        }));
    }

    /// Team of the tracked player closest to where the ball came down; ties go to team A.
    fn scoring_team(&self, ball: &na::Point2<f32>) -> Option<TeamSlot> {
        let da = self.trackers[0].closest(ball).map(|(_, d)| d);
        let db = self.trackers[1].closest(ball).map(|(_, d)| d);

        match (da, db) {
            (Some(a), Some(b)) if b < a => Some(TeamSlot::B),
            (Some(_), _) => Some(TeamSlot::A),
            (None, Some(_)) => Some(TeamSlot::B),
            (None, None) => None,
        }
    }

    fn report(&self, index: u64, events: Vec<Event>) -> FrameReport {
        let players = TeamSlot::ALL
            .iter()
            .flat_map(|&team| {
                let name = self.config.team_name(team);
                self.trackers[team.index()]
                    .players()
                    .map(move |p| PlayerBox::from_tracked(p, name))
            })
            .collect();

        FrameReport {
            frame: index,
            ball: self.ball.latest().copied(),
            hoop: self.hoop.latest().copied(),
            players,
            phase: self.attempt.phase,
            shot_type: self.last_shot_points,
            shot_overlay: self.overlays.shot().cloned(),
            foul_overlay: self.overlays.foul().cloned(),
            scoreboard: self.scoreboard.clone(),
            events,
        }
    }
}
