//! Audio chains: placement, ducking, fades, and the final mix.

use reelsmith_timeline::{AudioClip, AudioKind};

use crate::expr::Expr;
use crate::graph::{format_secs, Filter};

/// Music gain while narration plays, relative to its base volume.
pub const DUCK_FACTOR: f64 = 0.3;

/// Ducking starts this long before narration begins.
pub const DUCK_LEAD: f64 = 0.5;

/// Ducking ends this long after narration stops.
pub const DUCK_TAIL: f64 = 0.3;

/// Merge `[start, end]` windows into disjoint, ascending intervals.
pub fn merge_windows(mut windows: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    windows.retain(|(s, e)| s.is_finite() && e.is_finite() && e >= s);
    windows.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut merged: Vec<(f64, f64)> = Vec::with_capacity(windows.len());
    for (start, end) in windows {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

/// Ducking windows around every narration span.
pub fn ducking_windows(narration: &[(f64, f64)]) -> Vec<(f64, f64)> {
    merge_windows(
        narration
            .iter()
            .map(|&(s, e)| (s - DUCK_LEAD, e + DUCK_TAIL))
            .collect(),
    )
}

/// Volume envelope: `DUCK_FACTOR * base` inside any ducking window, `base`
/// elsewhere.
pub fn ducking_volume(base: f64, narration: &[(f64, f64)]) -> Expr {
    let windows = ducking_windows(narration);
    let Some(inside) = windows
        .iter()
        .map(|&(s, e)| Expr::t().between(Expr::c(s), Expr::c(e)))
        .reduce(|a, b| a + b)
    else {
        return Expr::c(base);
    };
    Expr::if_else(inside.gt(Expr::c(0.0)), Expr::c(DUCK_FACTOR * base), Expr::c(base))
}

/// Gain for `clip`: ducked when it is music marked for ducking and any
/// narration exists, constant otherwise.
pub fn volume_for(clip: &AudioClip, narration: &[(f64, f64)]) -> Expr {
    if clip.ducking && clip.kind == AudioKind::Music && !narration.is_empty() {
        ducking_volume(clip.volume, narration)
    } else {
        Expr::c(clip.volume)
    }
}

/// Chain placing one clip on the timeline, padded to `total` seconds.
pub fn audio_chain(clip: &AudioClip, narration: &[(f64, f64)], total: f64) -> Vec<Filter> {
    let delay_ms = (clip.start * 1000.0).round().max(0.0) as u64;
    let mut filters = vec![
        Filter::new("atrim").opt("duration", format_secs(clip.duration)),
        Filter::new("asetpts").pos("PTS-STARTPTS"),
        Filter::new("adelay").opt("delays", delay_ms).opt("all", 1),
        Filter::new("apad").opt("whole_dur", format_secs(total)),
    ];

    filters.push(match volume_for(clip, narration) {
        Expr::Const(v) => Filter::new("volume").opt("volume", v),
        envelope => Filter::new("volume")
            .expr("volume", envelope)
            .opt("eval", "frame"),
    });

    if clip.kind != AudioKind::Narration {
        if clip.fade_in > 0.0 {
            filters.push(
                Filter::new("afade")
                    .opt("t", "in")
                    .opt("st", format_secs(clip.start))
                    .opt("d", format_secs(clip.fade_in)),
            );
        }
        if clip.fade_out > 0.0 {
            filters.push(
                Filter::new("afade")
                    .opt("t", "out")
                    .opt("st", format_secs(clip.end() - clip.fade_out))
                    .opt("d", format_secs(clip.fade_out)),
            );
        }
    }
    filters.push(Filter::new("atrim").opt("duration", format_secs(total)));
    filters
}

/// Broadcast loudness pass applied to every mix.
pub fn loudnorm() -> Filter {
    Filter::new("loudnorm")
        .opt("I", -16)
        .opt("TP", -1.5)
        .opt("LRA", 11)
}

/// Final mix for `streams` processed chains; `None` when there is no audio.
pub fn mix_filters(streams: usize) -> Option<Vec<Filter>> {
    match streams {
        0 => None,
        1 => Some(vec![loudnorm()]),
        n => Some(vec![
            Filter::new("amix")
                .opt("inputs", n)
                .opt("duration", "longest")
                .opt("normalize", 0),
            loudnorm(),
        ]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Env;
    use proptest::prelude::*;

    #[test]
    fn test_merge_windows() {
        assert_eq!(
            merge_windows(vec![(5.0, 6.0), (0.0, 2.0), (1.5, 3.0), (3.0, 4.0)]),
            vec![(0.0, 4.0), (5.0, 6.0)]
        );
        assert!(merge_windows(vec![(2.0, 1.0)]).is_empty());
    }

    #[test]
    fn test_only_ducked_music_gets_an_envelope() {
        let narration = [(1.0, 4.0)];
        let mut music = AudioClip::new("m", "/m.mp3", AudioKind::Music, 0.0, 10.0);
        music.volume = 0.5;
        assert_eq!(volume_for(&music, &narration), Expr::c(0.5));

        music.ducking = true;
        assert_ne!(volume_for(&music, &narration), Expr::c(0.5));
        assert_eq!(volume_for(&music, &[]), Expr::c(0.5));

        let mut sfx = AudioClip::new("s", "/s.wav", AudioKind::Sfx, 0.0, 1.0);
        sfx.ducking = true;
        assert_eq!(volume_for(&sfx, &narration), Expr::c(1.0));
    }

    #[test]
    fn test_narration_is_not_faded() {
        let mut n = AudioClip::new("n", "/n.mp3", AudioKind::Narration, 2.0, 3.0);
        n.fade_in = 0.5;
        let chain = audio_chain(&n, &[], 10.0);
        assert!(chain.iter().all(|f| f.name() != "afade"));
        assert_eq!(chain[0].name(), "atrim");
        assert!(chain.iter().any(|f| f.name() == "adelay"));
    }

    #[test]
    fn test_mix_shapes() {
        assert!(mix_filters(0).is_none());
        let single = mix_filters(1).unwrap();
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].name(), "loudnorm");
        let multi = mix_filters(3).unwrap();
        assert_eq!(multi[0].name(), "amix");
        assert_eq!(multi[1].name(), "loudnorm");
    }

    proptest! {
        #[test]
        fn prop_ducking_window(
            s in 0.0f64..50.0,
            len in 0.1f64..20.0,
            base in 0.0f64..2.0,
            probe in 0.0f64..80.0,
        ) {
            let e = s + len;
            let envelope = ducking_volume(base, &[(s, e)]);
            let volume = envelope.eval(&Env::at(probe)).unwrap();
            if probe >= s - DUCK_LEAD && probe <= e + DUCK_TAIL {
                prop_assert_eq!(volume, DUCK_FACTOR * base);
            } else {
                prop_assert_eq!(volume, base);
            }
        }
    }
}
