use proptest::prelude::*;

use super::common::*;
use crate::survey::catalog::Catalog;
use crate::survey::domain::{Answer, AnswerSet, Tool};
use crate::survey::scoring::{rank, recommend, Scorer};

const QUESTIONS: usize = 12;

fn choices() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(0usize..4, QUESTIONS)
}

fn answers_from(catalog: &Catalog, choices: &[usize]) -> Vec<Answer> {
    catalog
        .list_questions()
        .iter()
        .zip(choices)
        .map(|(question, idx)| Answer::new(question.id, question.options[*idx].id))
        .collect()
}

proptest! {
    #[test]
    fn scoring_ignores_answer_order(
        (choices, shuffled) in choices().prop_flat_map(|choices| {
            let indices: Vec<usize> = (0..QUESTIONS).collect();
            (Just(choices), Just(indices).prop_shuffle())
        })
    ) {
        let catalog = catalog();
        let answers = answers_from(&catalog, &choices);
        let reordered: Vec<&Answer> = shuffled.iter().map(|idx| &answers[*idx]).collect();

        let scorer = Scorer::new(&catalog);
        prop_assert_eq!(scorer.score_answers(answers.iter()), scorer.score_answers(reordered));
    }

    #[test]
    fn adding_an_answer_never_lowers_a_score(
        choices in choices(),
        held_back in 0usize..QUESTIONS,
    ) {
        let catalog = catalog();
        let answers = answers_from(&catalog, &choices);
        let partial: AnswerSet = answers
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != held_back)
            .map(|(_, answer)| answer.clone())
            .collect();
        let full: AnswerSet = answers.into_iter().collect();

        let scorer = Scorer::new(&catalog);
        let before = scorer.score(&partial);
        let after = scorer.score(&full);
        for tool in Tool::ALL {
            prop_assert!(after.get(tool) >= before.get(tool));
        }
    }

    #[test]
    fn changing_one_answer_only_moves_that_question_weights(
        choices in choices(),
        question_idx in 0usize..QUESTIONS,
        replacement in 0usize..4,
    ) {
        let catalog = catalog();
        let mut changed = choices.clone();
        changed[question_idx] = replacement;

        let scorer = Scorer::new(&catalog);
        let original: AnswerSet = answers_from(&catalog, &choices).into_iter().collect();
        let updated: AnswerSet = answers_from(&catalog, &changed).into_iter().collect();
        let before = scorer.score(&original);
        let after = scorer.score(&updated);

        let question = &catalog.list_questions()[question_idx];
        let old_weights = question.options[choices[question_idx]].weights;
        let new_weights = question.options[replacement].weights;
        for tool in Tool::ALL {
            prop_assert_eq!(
                i64::from(after.get(tool)) - i64::from(before.get(tool)),
                i64::from(new_weights.get(tool)) - i64::from(old_weights.get(tool))
            );
        }
    }

    #[test]
    fn recommendation_heads_the_ranking(choices in choices()) {
        let catalog = catalog();
        let answers: AnswerSet = answers_from(&catalog, &choices).into_iter().collect();
        let scores = Scorer::new(&catalog).score(&answers);
        let order = catalog.tool_order();

        let recommendation = recommend(&scores, order);
        let ranking = rank(&scores, order);

        prop_assert_eq!(ranking.len(), Tool::COUNT);
        prop_assert_eq!(ranking[0].tool, recommendation.tool);
        for tool in Tool::ALL {
            prop_assert!(recommendation.score >= scores.get(tool));
            if scores.get(tool) == recommendation.score {
                prop_assert!(order.position(recommendation.tool) <= order.position(tool));
            }
        }
    }
}
