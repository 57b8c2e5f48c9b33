//! Cypher text for every statement
//!
//! Statement bodies are constants. The only composed pieces are WHERE clauses
//! built from fixed predicates, ORDER BY expressions chosen from sort enums,
//! and the numeric hop bound of the path search.

pub const UPSERT_USER: &str = r#"
MERGE (u:User {userId: $userId})
SET u += $props
WITH u
FOREACH (attr IN $attributes |
    MERGE (a:Attribute {attributeType: attr.type, value: attr.value})
    SET a.rawValue = attr.rawValue
    MERGE (u)-[ha:HAS_ATTRIBUTE]->(a)
    SET ha.confidenceScore = attr.confidence
)
FOREACH (pm IN $paymentMethods |
    MERGE (p:PaymentMethod {paymentMethodId: pm.id})
    SET p += pm.props
    MERGE (u)-[upm:USES_PAYMENT_METHOD]->(p)
    SET upm.firstUsedAt = pm.firstUsedAt,
        upm.lastUsedAt = pm.lastUsedAt
)
RETURN u.userId AS userId
"#;

// Both MATCH clauses must succeed or the statement returns no row and writes
// nothing. The subquery aggregates so the outer row survives attributes that
// link to no other transaction. LINKED_TO is merged without direction.
pub const UPSERT_TRANSACTION: &str = r#"
MATCH (sender:User {userId: $senderId})
MATCH (receiver:User {userId: $receiverId})
MERGE (t:Transaction {transactionId: $transactionId})
SET t += $props
MERGE (sender)-[ps:PARTICIPATED_IN {transactionId: $transactionId, role: "SENDER"}]->(t)
SET ps.amount = $amount, ps.currency = $currency, ps.timestamp = $timestamp
MERGE (receiver)-[pr:PARTICIPATED_IN {transactionId: $transactionId, role: "RECEIVER"}]->(t)
SET pr.amount = $amount, pr.currency = $currency, pr.timestamp = $timestamp
MERGE (sender)-[st:SENT_TO {transactionId: $transactionId}]->(receiver)
SET st.amount = $amount, st.currency = $currency, st.timestamp = $timestamp
MERGE (receiver)-[rf:RECEIVED_FROM {transactionId: $transactionId}]->(sender)
SET rf.amount = $amount, rf.currency = $currency, rf.timestamp = $timestamp
WITH t
CALL {
    WITH t
    UNWIND $attributes AS attr
    MERGE (a:Attribute {attributeType: attr.type, value: attr.value})
    SET a.rawValue = attr.rawValue
    MERGE (t)-[hta:HAS_ATTRIBUTE]->(a)
    SET hta.origin = "TRANSACTION"
    WITH t, a, attr
    MATCH (other:Transaction)-[:HAS_ATTRIBUTE]->(a)
    WHERE other.transactionId <> $transactionId
    MERGE (t)-[lt:LINKED_TO {attributeHash: attr.value, linkType: attr.type}]-(other)
    SET lt.score = attr.score, lt.updatedAt = $linkedAt
    RETURN count(*) AS linked
}
WITH t
OPTIONAL MATCH (pm:PaymentMethod {paymentMethodId: $paymentMethodId})
FOREACH (_ IN CASE WHEN $paymentMethodId = "" OR pm IS NULL THEN [] ELSE [1] END |
    MERGE (t)-[pmr:PAYMENT_METHOD_RELATES]->(pm)
    SET pmr.role = "SENDER"
)
RETURN t.transactionId AS transactionId
"#;

pub const USER_DIRECT_LINKS: &str = r#"
MATCH (u:User {userId: $userId})-[r:SENT_TO|RECEIVED_FROM]->(peer:User)
RETURN peer.userId AS peerId,
       type(r) AS linkType,
       CASE WHEN type(r) = "SENT_TO" THEN "OUTBOUND" ELSE "INBOUND" END AS direction,
       r.transactionId AS transactionId,
       r.amount AS amount,
       r.currency AS currency,
       r.timestamp AS timestamp
"#;

pub const USER_TRANSACTIONS: &str = r#"
MATCH (u:User {userId: $userId})-[rel:PARTICIPATED_IN]->(t:Transaction)
RETURN t.transactionId AS transactionId,
       rel.role AS role,
       t.amount AS amount,
       t.currency AS currency,
       t.timestamp AS timestamp
"#;

pub const USER_SHARED_ATTRIBUTES: &str = r#"
MATCH (u:User {userId: $userId})-[:HAS_ATTRIBUTE]->(a:Attribute)<-[:HAS_ATTRIBUTE]-(other:User)
WHERE other.userId <> $userId
RETURN a.attributeType AS attributeType,
       a.value AS attributeHash,
       collect(DISTINCT other.userId) AS userIds
"#;

pub const TRANSACTION_USERS: &str = r#"
MATCH (t:Transaction {transactionId: $transactionId})<-[rel:PARTICIPATED_IN]-(user:User)
RETURN user.userId AS userId,
       rel.role AS role,
       rel.amount AS amount,
       rel.currency AS currency,
       CASE WHEN rel.role = "SENDER" THEN "OUTBOUND" ELSE "INBOUND" END AS direction
"#;

pub const LINKED_TRANSACTIONS: &str = r#"
MATCH (t:Transaction {transactionId: $transactionId})-[link:LINKED_TO]-(other:Transaction)
RETURN other.transactionId AS otherTransactionId,
       link.linkType AS linkType,
       link.attributeHash AS attributeHash,
       link.score AS score,
       link.updatedAt AS updatedAt
"#;

/// Edge types the path search may cross, in either direction
pub const PATH_EDGE_TYPES: &str =
    "SENT_TO|RECEIVED_FROM|HAS_ATTRIBUTE|PARTICIPATED_IN|LINKED_TO|USES_PAYMENT_METHOD|PAYMENT_METHOD_RELATES";

pub fn shortest_path(max_hops: u32) -> String {
    format!(
        r#"
MATCH (source:User {{userId: $sourceId}}), (target:User {{userId: $targetId}})
MATCH path = shortestPath((source)-[:{types}*..{max_hops}]-(target))
RETURN [n IN nodes(path) | {{
  id: coalesce(n.userId, n.transactionId, n.paymentMethodId, n.value, elementId(n)),
  label: coalesce(n.userId, n.transactionId, n.attributeType, n.paymentMethodId, n.value),
  type: head(labels(n)),
  weight: 1.0
}}] AS nodes,
[rel IN relationships(path) | {{
  type: type(rel),
  sourceId: coalesce(startNode(rel).userId, startNode(rel).transactionId, startNode(rel).paymentMethodId, startNode(rel).value),
  targetId: coalesce(endNode(rel).userId, endNode(rel).transactionId, endNode(rel).paymentMethodId, endNode(rel).value),
  label: type(rel),
  weight: 1.0
}}] AS edges,
length(path) AS hops
"#,
        types = PATH_EDGE_TYPES,
        max_hops = max_hops
    )
}

const USER_SUMMARY_RETURN: &str = r#"
RETURN u.userId AS userId,
       u.fullName AS fullName,
       u.email AS email,
       u.phone AS phone,
       u.kycStatus AS kycStatus,
       u.riskScore AS riskScore,
       u.createdAt AS createdAt,
       u.updatedAt AS updatedAt"#;

const TRANSACTION_SUMMARY_RETURN: &str = r#"
RETURN t.transactionId AS transactionId,
       t.amount AS amount,
       t.currency AS currency,
       t.type AS type,
       t.status AS status,
       t.channel AS channel,
       t.timestamp AS timestamp,
       t.createdAt AS createdAt,
       t.updatedAt AS updatedAt,
       head([(sender:User)-[:PARTICIPATED_IN {role: "SENDER"}]->(t) | sender.userId]) AS senderId,
       head([(receiver:User)-[:PARTICIPATED_IN {role: "RECEIVER"}]->(t) | receiver.userId]) AS receiverId"#;

pub fn list_users(where_clause: &str, order_by: &str) -> String {
    format!(
        "\nMATCH (u:User)\n{}{}\nORDER BY {}\nSKIP $skip LIMIT $limit\n",
        where_clause, USER_SUMMARY_RETURN, order_by
    )
}

pub fn count_users(where_clause: &str) -> String {
    format!("\nMATCH (u:User)\n{}\nRETURN count(u) AS total\n", where_clause)
}

pub fn list_transactions(where_clause: &str, order_by: &str) -> String {
    format!(
        "\nMATCH (t:Transaction)\n{}{}\nORDER BY {}\nSKIP $skip LIMIT $limit\n",
        where_clause, TRANSACTION_SUMMARY_RETURN, order_by
    )
}

pub fn count_transactions(where_clause: &str) -> String {
    format!("\nMATCH (t:Transaction)\n{}\nRETURN count(t) AS total\n", where_clause)
}

pub fn export_users() -> String {
    format!("\nMATCH (u:User){}\nORDER BY u.userId\n", USER_SUMMARY_RETURN)
}

pub fn export_transactions() -> String {
    format!(
        "\nMATCH (t:Transaction){}\nORDER BY datetime(t.timestamp) DESC\n",
        TRANSACTION_SUMMARY_RETURN
    )
}

pub const PING: &str = "RETURN 1 AS ok";
