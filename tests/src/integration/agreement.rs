//! # Agreement
//!
//! TLI certificates feeding the DAG ledger: the precommits that certify a
//! block's digest become the block's votes.

#[cfg(test)]
mod tests {
    use crate::harness::XTZ;
    use mp_04_dag_ledger::{DagBlock, DagLedger, QuorumCertificate};
    use mp_05_tli_consensus::{ConsensusEngine, Proposal, TliConfig, TliEngine, Vote};
    use rand::seq::SliceRandom;
    use serde_json::json;
    use shared_types::{MessageBody, TransferOrder};
    use uuid::Uuid;

    const SHARD: &str = "S0";

    fn committee(config: TliConfig) -> Vec<TliEngine> {
        (1..=config.n())
            .map(|i| {
                TliEngine::new(
                    config,
                    format!("auth{}", i),
                    format!("signed_by_authority_auth{}", i),
                )
                .unwrap()
            })
            .collect()
    }

    fn block_proposal(block: &DagBlock, round: u64) -> Proposal {
        Proposal {
            height: block.round(),
            round,
            shard_id: SHARD.to_string(),
            proposal_hash: block.digest().to_string(),
            proposer: block.author().to_string(),
            payload: block.to_payload(),
        }
    }

    fn run_prevotes(engines: &mut [TliEngine], prevotes: &[Vote]) -> Vec<Vote> {
        let mut precommits = Vec::new();
        for engine in engines.iter_mut() {
            for prevote in prevotes {
                if let Some(precommit) = engine.on_prevote(prevote).unwrap() {
                    precommits.push(precommit);
                }
            }
        }
        precommits
    }

    #[test]
    fn test_tli_certificate_commits_dag_block() {
        let config = TliConfig::new(4, 1).unwrap();
        let mut engines = committee(config);
        let mut dag = DagLedger::new(config.quorum()).unwrap();

        let order = TransferOrder::new("alice", "bob", XTZ, 10, 1);
        let block = dag
            .create_block("auth1", serde_json::to_value(&order).unwrap(), None)
            .unwrap();
        let block_id = block.block_id();
        let proposal = block_proposal(&block, 0);
        dag.add_block(block).unwrap();

        let prevotes: Vec<Vote> = engines.iter_mut().map(|e| e.on_proposal(&proposal)).collect();
        let precommits = run_prevotes(&mut engines, &prevotes);
        assert_eq!(precommits.len(), 4);

        let observer = &mut engines[1];
        let certificate = precommits
            .iter()
            .find_map(|pc| observer.on_precommit(pc).unwrap())
            .unwrap();
        assert_eq!(certificate.precommits.len(), 3);

        let decoded = DagBlock::from_payload(proposal.payload.clone()).unwrap();
        assert_eq!(decoded.digest(), certificate.proposal_hash);

        let qc = QuorumCertificate::new(block_id, decoded.round(), certificate.precommits.clone());
        assert_eq!(dag.record_certificate(&qc).unwrap(), 3);
        let committed = dag.commit_ready_blocks();
        assert_eq!(committed.len(), 1);
        assert_eq!(committed[0].block_id(), block_id);

        let wire = certificate.to_message(order.order_id, config.quorum());
        let body = MessageBody::Certificate(wire);
        assert_eq!(body.message_type().as_str(), "certificate");
    }

    #[test]
    fn test_locked_validators_refuse_conflicting_block() {
        let config = TliConfig::new(4, 1).unwrap();
        let mut engines = committee(config);
        let dag = DagLedger::new(config.quorum()).unwrap();

        let first = dag.create_block("auth1", json!({"tx": "T1"}), None).unwrap();
        let rival = dag.create_block("auth2", json!({"tx": "T2"}), None).unwrap();
        let first_proposal = block_proposal(&first, 0);

        let prevotes: Vec<Vote> = engines
            .iter_mut()
            .map(|e| e.on_proposal(&first_proposal))
            .collect();
        run_prevotes(&mut engines, &prevotes);

        // Round 1 proposes the rival block; every engine re-prevotes its lock.
        let rival_proposal = block_proposal(&rival, 1);
        for engine in engines.iter_mut() {
            let vote = engine.on_proposal(&rival_proposal);
            assert_eq!(vote.proposal_hash, first.digest());
            assert_eq!(engine.locked(SHARD).as_deref(), Some(first.digest()));
        }
    }

    #[test]
    fn test_dag_commits_parents_first_under_shuffled_votes() {
        let mut dag = DagLedger::new(3).unwrap();
        let mut chain = Vec::new();
        for seq in 0..6 {
            let author = format!("auth{}", seq % 4 + 1);
            let block = dag.create_block(&author, json!({ "seq": seq }), None).unwrap();
            chain.push(block.block_id());
            dag.add_block(block).unwrap();
        }

        let mut votes: Vec<(Uuid, String)> = chain
            .iter()
            .flat_map(|id| (1..=3).map(move |v| (*id, format!("auth{}", v))))
            .collect();
        votes.shuffle(&mut rand::thread_rng());

        let mut commit_order = Vec::new();
        for (block_id, voter) in votes {
            dag.record_vote(block_id, &voter, "sig").unwrap();
            commit_order.extend(dag.commit_ready_blocks().iter().map(DagBlock::block_id));
        }
        assert_eq!(commit_order, chain);
    }
}
