//! KnowledgeDiffusionModel - how knowledge domains spread across an
//! [`AgentNetwork`].
//!
//! Each agent holds a level in [0, 1] per knowledge domain. A step lets
//! every agent learn from neighbours that know more than it does (scaled
//! by its learning rate and the domain's complexity) and practise on its
//! own once it knows anything at all. Domains with an unmet prerequisite
//! do not move.
//!
//! The model owns its network; reach it through [`KnowledgeDiffusionModel::network`]
//! and [`KnowledgeDiffusionModel::network_mut`].

use crate::network::AgentNetwork;
use agora_core::types::{AgentAttributes, AgentId, DomainId, KnowledgeDomain};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// Prerequisites below this level block progress in dependent domains.
pub const PREREQUISITE_LEVEL: f64 = 0.5;
/// Levels below this count as a knowledge gap.
pub const GAP_LEVEL: f64 = 0.4;
/// Learning rate used when none is given.
pub const DEFAULT_LEARNING_RATE: f64 = 0.1;
/// Candidates considered when assembling teams.
pub const TEAM_CANDIDATE_POOL: usize = 10;
/// Teams returned by [`KnowledgeDiffusionModel::find_optimal_teams`].
pub const TEAMS_RETURNED: usize = 5;

/// An agent's knowledge levels and learning rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentKnowledge {
    pub levels: BTreeMap<DomainId, f64>,
    pub learning_rate: f64,
}

impl AgentKnowledge {
    pub fn level(&self, domain: &str) -> Option<f64> {
        self.levels.get(domain).copied()
    }

    /// A prerequisite blocks only if the agent holds it below [`PREREQUISITE_LEVEL`].
    fn prerequisites_met(&self, domain: &KnowledgeDomain) -> bool {
        domain
            .prerequisites
            .iter()
            .all(|p| self.levels.get(p).map_or(true, |&l| l >= PREREQUISITE_LEVEL))
    }
}

/// Expertise band of a single level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expertise {
    /// Below 0.1.
    Uninitiated,
    /// 0.1 up to (excluding) 0.4.
    Novice,
    /// 0.4 through 0.8 inclusive.
    Intermediate,
    /// Above 0.8.
    Expert,
}

impl Expertise {
    pub fn of(level: f64) -> Self {
        if level > 0.8 {
            Expertise::Expert
        } else if level >= 0.4 {
            Expertise::Intermediate
        } else if level >= 0.1 {
            Expertise::Novice
        } else {
            Expertise::Uninitiated
        }
    }
}

/// Mean, median, extremes and population standard deviation of a set of levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelSummary {
    pub mean: f64,
    pub median: f64,
    pub max: f64,
    pub min: f64,
    pub std: f64,
}

impl LevelSummary {
    /// `None` for an empty slice.
    pub fn of(levels: &[f64]) -> Option<Self> {
        if levels.is_empty() {
            return None;
        }
        let n = levels.len() as f64;
        let mean = levels.iter().sum::<f64>() / n;
        let variance = levels.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / n;

        let mut sorted = levels.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };

        Some(Self {
            mean,
            median,
            max: sorted[sorted.len() - 1],
            min: sorted[0],
            std: variance.sqrt(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainStatistics {
    #[serde(flatten)]
    pub summary: LevelSummary,
    pub experts: usize,
    pub intermediates: usize,
    pub novices: usize,
    pub uninitiated: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeStatistics {
    pub time_step: u64,
    pub agents: usize,
    pub domains: usize,
    pub domain_stats: BTreeMap<DomainId, DomainStatistics>,
    /// Over every level every agent holds; `None` if nobody holds any.
    pub overall: Option<LevelSummary>,
    /// Number of expert domains → number of agents with that many.
    pub expertise_distribution: BTreeMap<usize, usize>,
}

/// A candidate team for a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub members: Vec<AgentId>,
    /// Sum over required domains of `min(1, best member level / required)`.
    pub score: f64,
    /// `score` divided by the number of required domains.
    pub coverage: f64,
    /// Best member level per required domain held by any member.
    pub domain_coverage: BTreeMap<DomainId, f64>,
}

/// Knowledge domains and per-agent levels over an owned network.
pub struct KnowledgeDiffusionModel {
    network: AgentNetwork,
    domains: Vec<KnowledgeDomain>,
    domain_index: HashMap<DomainId, usize>,
    /// Agents with initialised knowledge, in initialisation order.
    agents: Vec<AgentId>,
    knowledge: HashMap<AgentId, AgentKnowledge>,
    time_step: u64,
}

impl KnowledgeDiffusionModel {
    pub fn new(network: AgentNetwork) -> Self {
        Self {
            network,
            domains: Vec::new(),
            domain_index: HashMap::new(),
            agents: Vec::new(),
            knowledge: HashMap::new(),
            time_step: 0,
        }
    }

    pub fn network(&self) -> &AgentNetwork {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut AgentNetwork {
        &mut self.network
    }

    pub fn into_network(self) -> AgentNetwork {
        self.network
    }

    pub fn time_step(&self) -> u64 {
        self.time_step
    }

    /// Registered domains in registration order.
    pub fn domains(&self) -> &[KnowledgeDomain] {
        &self.domains
    }

    pub fn domain(&self, id: &str) -> Option<&KnowledgeDomain> {
        self.domain_index.get(id).map(|&i| &self.domains[i])
    }

    /// Register a domain, replacing an existing one with the same id.
    pub fn add_knowledge_domain(
        &mut self,
        id: impl Into<DomainId>,
        complexity: f64,
        prerequisites: Vec<DomainId>,
    ) {
        let domain = KnowledgeDomain::new(id, complexity, prerequisites);
        info!("Added knowledge domain {} with complexity {}", domain.id, complexity);
        match self.domain_index.get(&domain.id) {
            Some(&i) => self.domains[i] = domain,
            None => {
                self.domain_index.insert(domain.id.clone(), self.domains.len());
                self.domains.push(domain);
            }
        }
    }

    /// Set an agent's knowledge, adding the agent to the network if needed.
    ///
    /// Registered domains missing from `levels` start at 0.0. Calling this
    /// again for the same agent replaces its knowledge.
    pub fn initialize_agent_knowledge(
        &mut self,
        agent: impl Into<AgentId>,
        levels: BTreeMap<DomainId, f64>,
        learning_rate: f64,
    ) {
        let agent = agent.into();
        if !self.network.contains_agent(&agent) {
            self.network.add_agent(agent.clone(), AgentAttributes::default());
        }

        let mut levels = levels;
        for domain in &self.domains {
            levels.entry(domain.id.clone()).or_insert(0.0);
        }

        if !self.knowledge.contains_key(&agent) {
            self.agents.push(agent.clone());
        }
        self.knowledge.insert(
            agent.clone(),
            AgentKnowledge {
                levels,
                learning_rate,
            },
        );
        debug!("Initialized knowledge for agent {}", agent);
    }

    pub fn agent_knowledge(&self, agent: &AgentId) -> Option<&AgentKnowledge> {
        self.knowledge.get(agent)
    }

    /// Agents with initialised knowledge, in initialisation order.
    pub fn agents(&self) -> &[AgentId] {
        &self.agents
    }

    /// Copy of every agent's levels.
    pub fn knowledge_levels(&self) -> BTreeMap<AgentId, BTreeMap<DomainId, f64>> {
        self.knowledge
            .iter()
            .map(|(id, k)| (id.clone(), k.levels.clone()))
            .collect()
    }

    /// Advance the model by `steps` update rounds.
    pub fn update_knowledge(&mut self, steps: usize) {
        for _ in 0..steps {
            self.perform_update();
            self.time_step += 1;
        }
        debug!("Knowledge model advanced to step {}", self.time_step);
    }

    /// One round. Every new level is computed from the levels at the start
    /// of the round, so influence travels one hop per round.
    fn perform_update(&mut self) {
        let snapshot = &self.knowledge;
        let mut next = snapshot.clone();

        for agent in &self.agents {
            let (Some(current), Some(target)) = (snapshot.get(agent), next.get_mut(agent)) else {
                continue;
            };
            let neighbors = self.network.weighted_neighbors(agent);

            for (domain_id, &level) in &current.levels {
                let Some(domain) = self.domain_index.get(domain_id).map(|&i| &self.domains[i]) else {
                    continue;
                };
                if !current.prerequisites_met(domain) {
                    continue;
                }

                let mut updated = level;

                let (weighted, total) = neighbors
                    .iter()
                    .filter_map(|(n, w)| {
                        snapshot
                            .get(n)
                            .and_then(|k| k.level(domain_id))
                            .filter(|&nl| nl > level)
                            .map(|nl| (w * nl, *w))
                    })
                    .fold((0.0, 0.0), |(a, t), (x, w)| (a + x, t + w));
                if total > 0.0 {
                    let social = weighted / total;
                    updated += current.learning_rate * domain.complexity_factor() * (social - level);
                }

                if level > 0.0 {
                    updated += 0.01 * sigmoid(10.0 * (level - 0.5));
                }

                target.levels.insert(domain_id.clone(), updated.clamp(0.0, 1.0));
            }
        }

        self.knowledge = next;
    }

    /// Distribution of knowledge across agents and domains.
    ///
    /// `None` until at least one agent has been initialised.
    pub fn knowledge_statistics(&self) -> Option<KnowledgeStatistics> {
        if self.knowledge.is_empty() {
            return None;
        }

        let mut domain_stats = BTreeMap::new();
        for domain in &self.domains {
            let levels: Vec<f64> = self
                .agents
                .iter()
                .filter_map(|a| self.knowledge.get(a))
                .map(|k| k.level(&domain.id).unwrap_or(0.0))
                .collect();
            let Some(summary) = LevelSummary::of(&levels) else {
                continue;
            };

            let count = |band: Expertise| levels.iter().filter(|&&l| Expertise::of(l) == band).count();
            domain_stats.insert(
                domain.id.clone(),
                DomainStatistics {
                    summary,
                    experts: count(Expertise::Expert),
                    intermediates: count(Expertise::Intermediate),
                    novices: count(Expertise::Novice),
                    uninitiated: count(Expertise::Uninitiated),
                },
            );
        }

        let all_levels: Vec<f64> = self
            .knowledge
            .values()
            .flat_map(|k| k.levels.values().copied())
            .collect();

        let mut expertise_distribution = BTreeMap::new();
        for knowledge in self.knowledge.values() {
            let experts = self
                .domains
                .iter()
                .filter(|d| Expertise::of(knowledge.level(&d.id).unwrap_or(0.0)) == Expertise::Expert)
                .count();
            *expertise_distribution.entry(experts).or_insert(0) += 1;
        }

        Some(KnowledgeStatistics {
            time_step: self.time_step,
            agents: self.knowledge.len(),
            domains: self.domains.len(),
            domain_stats,
            overall: LevelSummary::of(&all_levels),
            expertise_distribution,
        })
    }

    /// Per agent, the registered domains held below [`GAP_LEVEL`] whose
    /// prerequisites are met, in domain registration order.
    pub fn find_knowledge_gaps(&self) -> BTreeMap<AgentId, Vec<DomainId>> {
        self.agents
            .iter()
            .filter_map(|a| self.knowledge.get(a).map(|k| (a, k)))
            .map(|(agent, knowledge)| {
                let gaps = self
                    .domains
                    .iter()
                    .filter(|d| knowledge.level(&d.id).unwrap_or(0.0) < GAP_LEVEL)
                    .filter(|d| knowledge.prerequisites_met(d))
                    .map(|d| d.id.clone())
                    .collect();
                (agent.clone(), gaps)
            })
            .collect()
    }

    /// Best teams of up to `team_size` agents for a task.
    ///
    /// Candidates are the top [`TEAM_CANDIDATE_POOL`] agents by individual
    /// score; every combination of `min(team_size, pool)` of them is scored
    /// by the best member level per required domain, and the top
    /// [`TEAMS_RETURNED`] are returned best first.
    pub fn find_optimal_teams(&self, requirements: &BTreeMap<DomainId, f64>, team_size: usize) -> Vec<Team> {
        if self.knowledge.is_empty() {
            return Vec::new();
        }
        if team_size == 0 {
            warn!("Requested teams of size 0");
            return Vec::new();
        }

        let mut candidates: Vec<(&AgentId, f64)> = self
            .agents
            .iter()
            .filter_map(|a| self.knowledge.get(a).map(|k| (a, k)))
            .map(|(agent, knowledge)| {
                let score = requirements
                    .iter()
                    .filter_map(|(d, &req)| knowledge.level(d).map(|l| requirement_score(l, req)))
                    .sum::<f64>();
                (agent, score)
            })
            .collect();
        // Stable: ties keep initialisation order.
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
        candidates.truncate(TEAM_CANDIDATE_POOL);

        let pool: Vec<&AgentId> = candidates.into_iter().map(|(a, _)| a).collect();
        let size = team_size.min(pool.len());

        let mut teams: Vec<Team> = combinations(pool.len(), size)
            .into_iter()
            .map(|combo| {
                let members: Vec<AgentId> = combo.iter().map(|&i| pool[i].clone()).collect();
                self.score_team(members, requirements)
            })
            .collect();

        teams.sort_by(|a, b| b.score.total_cmp(&a.score));
        teams.truncate(TEAMS_RETURNED);
        teams
    }

    fn score_team(&self, members: Vec<AgentId>, requirements: &BTreeMap<DomainId, f64>) -> Team {
        let mut domain_coverage: BTreeMap<DomainId, f64> = BTreeMap::new();
        for member in &members {
            let Some(knowledge) = self.knowledge.get(member) else {
                continue;
            };
            for (domain, &level) in &knowledge.levels {
                if requirements.contains_key(domain) {
                    let best = domain_coverage.entry(domain.clone()).or_insert(0.0);
                    *best = best.max(level);
                }
            }
        }

        let score: f64 = requirements
            .iter()
            .map(|(d, &req)| requirement_score(domain_coverage.get(d).copied().unwrap_or(0.0), req))
            .sum();
        let coverage = if requirements.is_empty() {
            0.0
        } else {
            score / requirements.len() as f64
        };

        Team {
            members,
            score,
            coverage,
            domain_coverage,
        }
    }
}

/// Full credit when `level` meets `required`, proportional credit otherwise.
fn requirement_score(level: f64, required: f64) -> f64 {
    if level >= required {
        1.0
    } else {
        level / required
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// All `k`-subsets of `0..n` as ascending index lists, in lexicographic order.
fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    if k > n {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut combo: Vec<usize> = (0..k).collect();
    loop {
        out.push(combo.clone());
        // Rightmost position that can still advance.
        let Some(i) = (0..k).rev().find(|&i| combo[i] < n - k + i) else {
            return out;
        };
        combo[i] += 1;
        for j in (i + 1)..k {
            combo[j] = combo[j - 1] + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NetworkConfig;
    use agora_core::types::NetworkType;

    fn levels(pairs: &[(&str, f64)]) -> BTreeMap<DomainId, f64> {
        pairs.iter().map(|(d, l)| (d.to_string(), *l)).collect()
    }

    fn blank_model() -> KnowledgeDiffusionModel {
        let net = AgentNetwork::new("k", NetworkType::Random, NetworkConfig::empty().with_edge_probability(0.0));
        KnowledgeDiffusionModel::new(net)
    }

    #[test]
    fn expertise_bands() {
        assert_eq!(Expertise::of(0.81), Expertise::Expert);
        assert_eq!(Expertise::of(0.8), Expertise::Intermediate);
        assert_eq!(Expertise::of(0.4), Expertise::Intermediate);
        assert_eq!(Expertise::of(0.39), Expertise::Novice);
        assert_eq!(Expertise::of(0.1), Expertise::Novice);
        assert_eq!(Expertise::of(0.05), Expertise::Uninitiated);
    }

    #[test]
    fn summary_uses_population_std_and_middle_median() {
        let s = LevelSummary::of(&[0.0, 1.0, 0.5, 0.5]).unwrap();
        assert_eq!(s.mean, 0.5);
        assert_eq!(s.median, 0.5);
        assert!((s.std - (0.125f64).sqrt()).abs() < 1e-12);
        assert!(LevelSummary::of(&[]).is_none());
    }

    #[test]
    fn initialization_fills_registered_domains_and_adds_agent() {
        let mut model = blank_model();
        model.add_knowledge_domain("rust", 0.5, vec![]);
        model.add_knowledge_domain("go", 0.2, vec![]);
        model.initialize_agent_knowledge("a", levels(&[("rust", 0.7)]), 0.2);

        assert!(model.network().contains_agent(&"a".into()));
        let k = model.agent_knowledge(&"a".into()).unwrap();
        assert_eq!(k.level("go"), Some(0.0));
        assert_eq!(k.level("rust"), Some(0.7));
        assert_eq!(k.learning_rate, 0.2);
    }

    #[test]
    fn learning_only_from_more_knowledgeable_neighbours() {
        let mut model = blank_model();
        model.add_knowledge_domain("d", 0.0, vec![]);
        model.network_mut().add_connection("hi", "lo", 1.0);
        model.initialize_agent_knowledge("hi", levels(&[("d", 0.9)]), 0.1);
        model.initialize_agent_knowledge("lo", levels(&[("d", 0.0)]), 0.1);

        model.update_knowledge(1);
        let hi = model.agent_knowledge(&"hi".into()).unwrap().level("d").unwrap();
        let lo = model.agent_knowledge(&"lo".into()).unwrap().level("d").unwrap();

        // lo: 0.1 * 1.0 * (0.9 - 0.0); no practice at level 0
        assert!((lo - 0.09).abs() < 1e-12);
        // hi only practises
        assert!((hi - (0.9 + 0.01 * sigmoid(4.0))).abs() < 1e-12);
        assert_eq!(model.time_step(), 1);
    }

    #[test]
    fn gaps_respect_prerequisites() {
        let mut model = blank_model();
        model.add_knowledge_domain("basic", 0.1, vec![]);
        model.add_knowledge_domain("advanced", 0.9, vec!["basic".into()]);
        model.initialize_agent_knowledge("a", levels(&[("basic", 0.2)]), 0.1);
        model.initialize_agent_knowledge("b", levels(&[("basic", 0.6)]), 0.1);

        let gaps = model.find_knowledge_gaps();
        assert_eq!(gaps[&AgentId::new("a")], vec!["basic".to_string()]);
        assert_eq!(gaps[&AgentId::new("b")], vec!["advanced".to_string()]);
    }

    #[test]
    fn statistics_count_bands() {
        let mut model = blank_model();
        assert!(model.knowledge_statistics().is_none());

        model.add_knowledge_domain("d", 0.5, vec![]);
        model.initialize_agent_knowledge("a", levels(&[("d", 0.9)]), 0.1);
        model.initialize_agent_knowledge("b", levels(&[("d", 0.5)]), 0.1);
        model.initialize_agent_knowledge("c", levels(&[("d", 0.0)]), 0.1);

        let stats = model.knowledge_statistics().unwrap();
        let d = &stats.domain_stats["d"];
        assert_eq!((d.experts, d.intermediates, d.novices, d.uninitiated), (1, 1, 0, 1));
        assert_eq!(d.summary.median, 0.5);
        assert_eq!(stats.expertise_distribution[&1], 1);
        assert_eq!(stats.expertise_distribution[&0], 2);
        assert_eq!(stats.overall.unwrap().max, 0.9);
    }

    #[test]
    fn teams_take_best_member_per_domain() {
        let mut model = blank_model();
        model.add_knowledge_domain("x", 0.5, vec![]);
        model.add_knowledge_domain("y", 0.5, vec![]);
        model.initialize_agent_knowledge("xs", levels(&[("x", 1.0), ("y", 0.0)]), 0.1);
        model.initialize_agent_knowledge("ys", levels(&[("x", 0.0), ("y", 1.0)]), 0.1);
        model.initialize_agent_knowledge("mid", levels(&[("x", 0.4), ("y", 0.4)]), 0.1);

        let teams = model.find_optimal_teams(&levels(&[("x", 0.8), ("y", 0.8)]), 2);
        assert_eq!(teams.len(), 3);
        assert_eq!(teams[0].score, 2.0);
        assert_eq!(teams[0].coverage, 1.0);
        let mut members = teams[0].members.clone();
        members.sort();
        assert_eq!(members, vec![AgentId::new("xs"), AgentId::new("ys")]);
    }

    #[test]
    fn zero_team_size_gives_no_teams() {
        let mut model = blank_model();
        model.initialize_agent_knowledge("a", levels(&[("x", 1.0)]), 0.1);
        assert!(model.find_optimal_teams(&levels(&[("x", 0.5)]), 0).is_empty());
    }

    #[test]
    fn combination_enumeration() {
        assert_eq!(combinations(4, 2).len(), 6);
        assert_eq!(combinations(3, 3), vec![vec![0, 1, 2]]);
        assert_eq!(combinations(10, 3).len(), 120);
        assert_eq!(combinations(3, 0), vec![Vec::<usize>::new()]);
        assert!(combinations(2, 3).is_empty());
    }
}
