//! Factory functions for content used across tests.

use mathlearn_core::{
    Answer, Flashcard, FlashcardDeck, LeaderboardEntry, Material, Quiz, QuizQuestion,
};
use uuid::Uuid;

pub fn material(title: &str) -> Material {
    Material {
        id: Uuid::new_v4(),
        category: "aljabar".into(),
        title: title.into(),
        content: "Rumus kuadrat: $$x = \\frac{-b \\pm \\sqrt{b^2-4ac}}{2a}$$ dengan $a \\neq 0$."
            .into(),
        created_at: None,
    }
}

/// Quiz with `n` two-option questions whose answer is option 1.
pub fn quiz(n: usize, time_limit_secs: Option<u32>) -> Quiz {
    Quiz {
        id: Uuid::new_v4(),
        category: "aljabar".into(),
        title: format!("Kuis {n} soal"),
        time_limit_secs,
        questions: (0..n)
            .map(|i| QuizQuestion {
                question: format!("Berapa $x$ jika $x - {i} = 1$?"),
                options: vec![i.to_string(), (i + 1).to_string()],
                correct_answer: Answer::Choice(1),
                explanation: None,
            })
            .collect(),
    }
}

pub fn deck(cards: usize) -> FlashcardDeck {
    FlashcardDeck {
        id: Uuid::new_v4(),
        category: "geometri".into(),
        title: "Rumus luas".into(),
        cards: (0..cards)
            .map(|i| Flashcard {
                front: format!("Kartu {}", i + 1),
                back: "$\\pi r^2$".into(),
            })
            .collect(),
    }
}

pub fn leaderboard(n: usize) -> Vec<LeaderboardEntry> {
    (0..n)
        .map(|i| LeaderboardEntry {
            user_id: Uuid::new_v4(),
            username: format!("siswa{}", i + 1),
            xp_points: 1000 - (i as u32) * 100,
            streak: 1,
        })
        .collect()
}
