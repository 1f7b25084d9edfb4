use filtermerge::{
    explain, Action, Condition, Decision, DecisionCache, Field, InferenceEngine, MergeGroup,
    MergeLevel, Node, Rule, SafetyLevel, SafetyVerdict,
};

fn main() {
    let rules = vec![
        Rule::builder(0)
            .when(Field::From, "notifications@github.com")
            .label("GitHub")
            .build(),
        Rule::builder(1)
            .when(Field::From, "notifications@github.com")
            .when(Field::Subject, "{review approved merged}")
            .label("GitHub/Reviews")
            .action(Action::Star(true))
            .build(),
        Rule::builder(2)
            .when(Field::From, "team@example.com")
            .label("Team")
            .build(),
        Rule::builder(3)
            .when(Field::From, "team@example.com")
            .label("Team2")
            .build(),
        Rule::builder(4)
            .when(Field::From, "accounts@example.com")
            .label("Accounts")
            .build(),
        Rule::builder(5)
            .when(Field::From, "accounts@example.com")
            .when(Field::Subject, "password reset")
            .label("Accounts/Reset")
            .build(),
    ];

    let engine = InferenceEngine::builder()
        .level(MergeLevel::Interactive)
        .build();

    // Accept everything short of BLOCK, the way a user holding "y" would.
    let mut answer = |group: &MergeGroup, verdict: &SafetyVerdict| {
        println!("? {group} [{}]", verdict.level());
        match verdict.level() {
            SafetyLevel::Block => Decision::Reject,
            _ => Decision::AcceptAllSimilar,
        }
    };
    let report = engine
        .infer_with(rules, &mut answer, &mut DecisionCache::new())
        .expect("inference failed");

    println!();
    println!("{report}");
    println!();
    for node in report.nodes() {
        match node {
            Node::Rule(rule) => println!("{}", rule.summary("")),
            Node::LabelMerge(merge) => {
                println!("for each label in {:?}:", merge.pivot_labels().collect::<Vec<_>>());
                println!("{}", merge.template().summary("  "));
            }
            Node::Tree(tree) => println!("tree of {} rules, depth {}", tree.len(), tree.depth()),
        }
        for rule in node.expand() {
            for condition in rule.conditions().values() {
                if let Condition::Query(query) = condition {
                    println!("  {}", explain(query.expr()));
                }
            }
        }
    }
}
