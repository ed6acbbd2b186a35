use super::NodeKind;
use itertools::Itertools;

/// The targets a node kind may legally feed into. The matrix is fixed and
/// not symmetric; sink and visualization nodes have no outputs.
pub fn allowed_targets(from: NodeKind) -> &'static [NodeKind] {
    use NodeKind::*;
    match from {
        Source => &[Filter, Join],
        Filter => &[
            Arithmetic,
            Count,
            Condition,
            Cast,
            Union,
            Visualization,
            Clean,
            Sink,
        ],
        Join => &[
            Filter,
            Arithmetic,
            Count,
            Condition,
            Cast,
            Union,
            Visualization,
            Clean,
            Sink,
        ],
        Cast => &[Arithmetic, Count, Condition, Visualization, Clean, Sink],
        Arithmetic | Count | Condition => &[
            Arithmetic,
            Count,
            Condition,
            Visualization,
            Clean,
            Cast,
            Sink,
        ],
        Union => &[
            Clean,
            Cast,
            Arithmetic,
            Count,
            Condition,
            Visualization,
            Sink,
        ],
        Clean => &[Sink, Count],
        Sink | Visualization => &[],
    }
}

/// Whether an edge from a node of kind `from` to one of kind `to` is legal.
pub fn can_connect(from: NodeKind, to: NodeKind) -> bool {
    allowed_targets(from).contains(&to)
}

/// Human-readable list of the legal targets of a kind, used in rejection
/// messages so the user learns the valid chain shape.
pub fn describe_allowed(from: NodeKind) -> String {
    let targets = allowed_targets(from);
    if targets.is_empty() {
        format!("nothing ({} is a terminal stage)", from)
    } else {
        targets.iter().map(|kind| kind.to_string()).join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use NodeKind::*;

    #[test]
    fn source_feeds_only_filter_and_join() {
        assert!(can_connect(Source, Filter));
        assert!(can_connect(Source, Join));
        for target in [Source, Cast, Clean, Count, Arithmetic, Condition, Union, Sink] {
            assert!(!can_connect(Source, target), "source -> {target}");
        }
    }

    #[test]
    fn clean_feeds_only_sink_and_count() {
        assert!(can_connect(Clean, Sink));
        assert!(can_connect(Clean, Count));
        assert!(!can_connect(Clean, Cast));
        assert!(!can_connect(Clean, Arithmetic));
    }

    #[test]
    fn compute_stages_feed_each_other() {
        for from in [Arithmetic, Count, Condition] {
            for to in [Arithmetic, Count, Condition, Cast, Clean, Sink, Visualization] {
                assert!(can_connect(from, to), "{from} -> {to}");
            }
            assert!(!can_connect(from, Filter));
            assert!(!can_connect(from, Union));
        }
    }

    #[test]
    fn terminal_stages_feed_nothing() {
        for from in [Sink, Visualization] {
            assert!(allowed_targets(from).is_empty());
        }
    }

    #[test]
    fn describe_names_targets() {
        assert!(describe_allowed(Source).contains("filter"));
        assert!(describe_allowed(Sink).contains("terminal"));
    }
}
