//! Step-by-step replay of a backend execution trace over the source text.

use crate::client::ExecutionStep;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepVisualizer {
    steps: Vec<ExecutionStep>,
    source: String,
    index: usize,
    playing: bool,
}

/// One rendered line of the current frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameLine<'a> {
    pub number: usize,
    pub text: &'a str,
    pub current: bool,
}

impl StepVisualizer {
    /// `None` when there is nothing to replay.
    pub fn new(steps: Vec<ExecutionStep>, source: impl Into<String>) -> Option<Self> {
        if steps.is_empty() {
            return None;
        }
        Some(Self { steps, source: source.into(), index: 0, playing: false })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn current(&self) -> &ExecutionStep {
        &self.steps[self.index]
    }

    pub fn can_step_back(&self) -> bool {
        self.index > 0
    }

    pub fn can_step_forward(&self) -> bool {
        self.index + 1 < self.steps.len()
    }

    pub fn step_back(&mut self) -> bool {
        if !self.can_step_back() {
            return false;
        }
        self.index -= 1;
        true
    }

    pub fn step_forward(&mut self) -> bool {
        if !self.can_step_forward() {
            return false;
        }
        self.index += 1;
        true
    }

    pub fn toggle_play(&mut self) {
        self.playing = !self.playing;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Advance one step while playing; playback stops on the last step.
    pub fn tick(&mut self) -> bool {
        if !self.playing {
            return false;
        }
        if self.step_forward() {
            if !self.can_step_forward() {
                self.playing = false;
            }
            true
        } else {
            self.playing = false;
            false
        }
    }

    /// Re-split the source and mark the current step's line. A step pointing
    /// past the end of the source marks nothing.
    pub fn frame(&self) -> Vec<FrameLine<'_>> {
        let current = self.current().line_number;
        self.source
            .split('\n')
            .enumerate()
            .map(|(number, text)| FrameLine { number, text, current: number == current })
            .collect()
    }

    pub fn description(&self) -> &str {
        &self.current().step_description
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(line: usize, desc: &str) -> ExecutionStep {
        ExecutionStep { line_number: line, step_description: desc.into() }
    }

    fn viz() -> StepVisualizer {
        StepVisualizer::new(vec![step(0, "x = 1"), step(1, "y = 2"), step(2, "print(x + y)")], "x = 1\ny = 2\nprint(x + y)")
            .unwrap()
    }

    #[test]
    fn empty_steps_have_no_visualizer() {
        assert!(StepVisualizer::new(vec![], "x").is_none());
    }

    #[test]
    fn bounds_of_manual_stepping() {
        let mut v = viz();
        assert!(!v.can_step_back());
        assert!(!v.step_back());
        assert!(v.step_forward());
        assert!(v.step_forward());
        assert!(!v.can_step_forward());
        assert!(!v.step_forward());
        assert_eq!(v.index(), 2);
        assert!(v.step_back());
        assert_eq!(v.description(), "y = 2");
    }

    #[test]
    fn playback_stops_at_end() {
        let mut v = viz();
        assert!(!v.tick());
        v.toggle_play();
        assert!(v.tick());
        assert!(v.is_playing());
        assert!(v.tick());
        assert!(!v.is_playing());
        assert_eq!(v.index(), 2);
        assert!(!v.tick());
    }

    #[test]
    fn frame_marks_only_current_line() {
        let mut v = viz();
        v.step_forward();
        let frame = v.frame();
        assert_eq!(frame.len(), 3);
        let marked: Vec<_> = frame.iter().filter(|l| l.current).map(|l| l.text).collect();
        assert_eq!(marked, vec!["y = 2"]);
    }

    #[test]
    fn out_of_range_line_marks_nothing() {
        let v = StepVisualizer::new(vec![step(9, "?")], "a\nb").unwrap();
        assert!(v.frame().iter().all(|l| !l.current));
    }
}
