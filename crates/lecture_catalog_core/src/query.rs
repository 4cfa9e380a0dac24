//! crates/lecture_catalog_core/src/query.rs
//!
//! Pure views over the full lecture and topic collections: the grade/topic
//! scoped lecture list and per-grade completion progress.
//!
//! A lecture whose topic cannot be resolved belongs to no grade. It is left out
//! of every grade-scoped list and out of both sides of the progress ratio.

use std::collections::{HashMap, HashSet};

use crate::domain::{Grade, GradeProgress, Lecture, Topic, TopicFilter};

fn grade_index(topics: &[Topic]) -> HashMap<&str, Grade> {
    topics
        .iter()
        .map(|topic| (topic.id.as_str(), topic.grade))
        .collect()
}

fn in_grade<'a>(
    lectures: &'a [Lecture],
    topics: &'a [Topic],
    grade: Grade,
) -> impl Iterator<Item = &'a Lecture> {
    let grades = grade_index(topics);
    lectures
        .iter()
        .filter(move |lecture| grades.get(lecture.topic_id.as_str()) == Some(&grade))
}

/// Lectures of `grade`, optionally narrowed to one topic, in input order.
pub fn filter_lectures(
    lectures: &[Lecture],
    topics: &[Topic],
    grade: Grade,
    topic_filter: &TopicFilter,
) -> Vec<Lecture> {
    in_grade(lectures, topics, grade)
        .filter(|lecture| topic_filter.admits(&lecture.topic_id))
        .cloned()
        .collect()
}

/// `round(100 * completed / total)`, rounding halves up; zero when `total` is zero.
pub fn percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total) as u64;
    let total = total as u64;
    ((200 * completed + total) / (2 * total)) as u8
}

/// Grade-wide completion; never scoped by a topic filter.
pub fn compute_progress(
    lectures: &[Lecture],
    topics: &[Topic],
    grade: Grade,
    completed_ids: &HashSet<String>,
) -> GradeProgress {
    let (total, completed) = in_grade(lectures, topics, grade).fold((0, 0), |(total, done), lecture| {
        let done = done + usize::from(completed_ids.contains(&lecture.id));
        (total + 1, done)
    });

    GradeProgress {
        grade,
        completed,
        total,
        percent: percent(completed, total),
    }
}

/// One independent [`compute_progress`] per supported grade.
pub fn grade_overview(
    lectures: &[Lecture],
    topics: &[Topic],
    completed_ids: &HashSet<String>,
) -> Vec<GradeProgress> {
    Grade::ALL
        .iter()
        .map(|&grade| compute_progress(lectures, topics, grade, completed_ids))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FileKind;
    use chrono::Utc;

    fn topic(id: &str, grade: Grade) -> Topic {
        Topic {
            id: id.to_string(),
            grade,
            month: 1,
            name: format!("Topic {}", id),
            icon: "book".to_string(),
        }
    }

    fn lecture(id: &str, topic_id: &str) -> Lecture {
        Lecture {
            id: id.to_string(),
            topic_id: topic_id.to_string(),
            title: format!("Lecture {}", id),
            description: String::new(),
            file_url: "data:application/pdf;base64,".to_string(),
            file_name: format!("{}.pdf", id),
            file_type: FileKind::Pdf,
            created_at: Utc::now(),
        }
    }

    fn fixture() -> (Vec<Lecture>, Vec<Topic>) {
        let topics = vec![topic("t1", Grade::Tenth), topic("t2", Grade::Eleventh)];
        let lectures = vec![lecture("l1", "t1"), lecture("l2", "t1"), lecture("l3", "t2")];
        (lectures, topics)
    }

    fn ids(lectures: &[Lecture]) -> Vec<&str> {
        lectures.iter().map(|l| l.id.as_str()).collect()
    }

    fn completed(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn test_filter_by_grade_and_topic() {
        let (lectures, topics) = fixture();

        let all = filter_lectures(&lectures, &topics, Grade::Tenth, &TopicFilter::All);
        assert_eq!(ids(&all), vec!["l1", "l2"]);

        let t1 = filter_lectures(&lectures, &topics, Grade::Tenth, &TopicFilter::parse("t1"));
        assert_eq!(ids(&t1), vec!["l1", "l2"]);

        // t2 is an eleventh-grade topic, so the grade stage already drops l3.
        let t2 = filter_lectures(&lectures, &topics, Grade::Tenth, &TopicFilter::parse("t2"));
        assert!(t2.is_empty());
    }

    #[test]
    fn test_filter_preserves_input_order() {
        let topics = vec![topic("t1", Grade::Twelfth), topic("t3", Grade::Twelfth)];
        let lectures = vec![lecture("z", "t3"), lecture("a", "t1"), lecture("m", "t3")];
        let scoped = filter_lectures(&lectures, &topics, Grade::Twelfth, &TopicFilter::All);
        assert_eq!(ids(&scoped), vec!["z", "a", "m"]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let (lectures, topics) = fixture();
        for grade in Grade::ALL {
            for filter in [TopicFilter::All, TopicFilter::parse("t1"), TopicFilter::parse("t2")] {
                let once = filter_lectures(&lectures, &topics, grade, &filter);
                let twice = filter_lectures(&once, &topics, grade, &filter);
                assert_eq!(once, twice);
            }
        }
    }

    #[test]
    fn test_progress_per_grade() {
        let (lectures, topics) = fixture();
        let done = completed(&["l1"]);

        let tenth = compute_progress(&lectures, &topics, Grade::Tenth, &done);
        assert_eq!((tenth.completed, tenth.total, tenth.percent), (1, 2, 50));

        let eleventh = compute_progress(&lectures, &topics, Grade::Eleventh, &done);
        assert_eq!((eleventh.completed, eleventh.total, eleventh.percent), (0, 1, 0));
    }

    #[test]
    fn test_empty_grade_has_zero_percent() {
        let (lectures, topics) = fixture();
        let twelfth = compute_progress(&lectures, &topics, Grade::Twelfth, &completed(&["l1", "l3"]));
        assert_eq!((twelfth.completed, twelfth.total, twelfth.percent), (0, 0, 0));
    }

    #[test]
    fn test_percent_rounds_to_nearest() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(1, 200), 1);
        assert_eq!(percent(3, 3), 100);
        assert_eq!(percent(0, 0), 0);
    }

    #[test]
    fn test_orphaned_lectures_are_invisible() {
        let (mut lectures, topics) = fixture();
        lectures.push(lecture("orphan", "deleted-topic"));
        let done = completed(&["l1", "orphan"]);

        for grade in Grade::ALL {
            let scoped = filter_lectures(&lectures, &topics, grade, &TopicFilter::All);
            assert!(!ids(&scoped).contains(&"orphan"));
        }
        let tenth = compute_progress(&lectures, &topics, Grade::Tenth, &done);
        assert_eq!((tenth.completed, tenth.total), (1, 2));
    }

    #[test]
    fn test_progress_ignores_completions_of_other_grades() {
        let (lectures, topics) = fixture();
        let done = completed(&["l3", "unknown-lecture"]);
        let tenth = compute_progress(&lectures, &topics, Grade::Tenth, &done);
        assert_eq!(tenth.completed, 0);
    }

    #[test]
    fn test_overview_covers_every_grade_independently() {
        let (lectures, topics) = fixture();
        let overview = grade_overview(&lectures, &topics, &completed(&["l1", "l3"]));

        let summary: Vec<_> = overview
            .iter()
            .map(|p| (p.grade, p.completed, p.total, p.percent))
            .collect();
        assert_eq!(
            summary,
            vec![
                (Grade::Tenth, 1, 2, 50),
                (Grade::Eleventh, 1, 1, 100),
                (Grade::Twelfth, 0, 0, 0),
            ]
        );
    }
}
